// monitor/run.rs
//
// One reconciliation run: read the owner directory and stored baseline,
// fetch current state per address, diff, persist, then hand the grouped
// changes to the dispatcher. Per-address failures are recorded and never
// abort the rest of the run.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{error, info, info_span, warn};

use crate::address::{normalize_key, parse_for_bis, parse_for_feed, BisKey};
use crate::config::{MonitorConfig, MonitoredAddress};
use crate::db::complaints::{get_all_incident_ids, insert_complaint};
use crate::db::connection::Database;
use crate::db::migrations::init_store;
use crate::db::owners::{get_all_assignments, get_all_owners, owner_addresses};
use crate::db::status::{get_all_statuses, set_bin, upsert_status, AddressStatus};
use crate::errors::MonitorError;
use crate::monitor::changes::{diff_status, ChangeSet, ComplaintAlert, FieldDelta, StatusChange};
use crate::monitor::retry::RetryPolicy;
use crate::notify::{dispatch_alerts, AlertSink, DispatchContext};
use crate::providers::{BisSummary, BuildingStatusProvider, ComplaintFeedProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunScope {
    All,
    Owner(i64),
}

#[derive(Debug)]
pub struct RunReport {
    pub addresses_checked: usize,
    pub failed_addresses: Vec<String>,
    pub changes: ChangeSet,
}

pub struct Monitor<'a> {
    pub db: &'a Database,
    pub bis: &'a dyn BuildingStatusProvider,
    pub feed: &'a dyn ComplaintFeedProvider,
    pub sink: &'a dyn AlertSink,
}

/// A first-pass BIS failure waiting for the batched second pass.
struct RetryEntry {
    key: String,
    bis_key: BisKey,
    cached_bin: Option<String>,
    owner_ids: Vec<i64>,
}

impl Monitor<'_> {
    pub fn run_check(
        &self,
        config: &MonitorConfig,
        scope: RunScope,
        policy: &RetryPolicy,
    ) -> Result<RunReport, MonitorError> {
        info!("starting building monitor check");
        init_store(self.db)?;

        let entries: Vec<MonitoredAddress> = match scope {
            RunScope::All => config.addresses.clone(),
            RunScope::Owner(id) => owner_addresses(self.db, id)?
                .into_iter()
                .map(MonitoredAddress::new)
                .collect(),
        };
        if entries.is_empty() {
            return Err(MonitorError::Config(match scope {
                RunScope::All => "no monitored addresses configured".to_string(),
                RunScope::Owner(id) => format!("owner {id} has no assigned addresses"),
            }));
        }

        let owners = get_all_owners(self.db)?;
        let mut owners_by_address: HashMap<String, Vec<i64>> = HashMap::new();
        let mut addresses_by_owner: HashMap<i64, HashSet<String>> = HashMap::new();
        for (address, owner_id) in get_all_assignments(self.db)? {
            owners_by_address
                .entry(address.clone())
                .or_default()
                .push(owner_id);
            addresses_by_owner
                .entry(owner_id)
                .or_default()
                .insert(address);
        }

        // Bulk-read the comparison baseline and the dedup ledger once,
        // before any writes.
        let baseline = get_all_statuses(self.db)?;
        let ledger = get_all_incident_ids(self.db)?;
        info!(
            addresses = entries.len(),
            owners = owners.len(),
            "run scope loaded"
        );

        let mut changes = ChangeSet::default();
        let mut failed: Vec<String> = Vec::new();
        let mut retry_queue: Vec<RetryEntry> = Vec::new();
        let mut checked: Vec<String> = Vec::new();

        for entry in &entries {
            let key = normalize_key(&entry.address);
            let span = info_span!("address", address = %key);
            let _guard = span.enter();
            checked.push(key.clone());

            let owner_ids = owners_by_address.get(&key).cloned().unwrap_or_default();

            // The two key forms parse independently; one failing does not
            // block the other check.
            match parse_for_bis(&entry.address) {
                Err(e) => {
                    warn!(error = %e, "skipping BIS check, address did not parse");
                    record_failure(&mut failed, &key);
                }
                Ok(bis_key) => match policy.run(|| self.bis.fetch_summary(&bis_key)) {
                    Ok(summary) => {
                        self.apply_summary(
                            &key,
                            &bis_key,
                            entry.bin.as_deref(),
                            &owner_ids,
                            summary,
                            &baseline,
                            &mut changes,
                        )?;
                    }
                    Err(e) => {
                        warn!(error = %e, "BIS check failed, queued for second pass");
                        retry_queue.push(RetryEntry {
                            key: key.clone(),
                            bis_key,
                            cached_bin: entry.bin.clone(),
                            owner_ids: owner_ids.clone(),
                        });
                    }
                },
            }

            self.check_complaints(
                &entry.address,
                &key,
                &owner_ids,
                config.feed_limit,
                &ledger,
                &mut changes,
                &mut failed,
            )?;
        }

        // Batched second pass: everything that exhausted its first-pass
        // attempts gets one more round after a single long cooldown.
        if !retry_queue.is_empty() {
            warn!(
                count = retry_queue.len(),
                "retrying failed addresses after cooldown"
            );
            policy.pause_before_second_pass();
            for entry in retry_queue {
                let span = info_span!("address", address = %entry.key);
                let _guard = span.enter();
                match policy.run(|| self.bis.fetch_summary(&entry.bis_key)) {
                    Ok(summary) => self.apply_summary(
                        &entry.key,
                        &entry.bis_key,
                        entry.cached_bin.as_deref(),
                        &entry.owner_ids,
                        summary,
                        &baseline,
                        &mut changes,
                    )?,
                    Err(e) => {
                        error!(error = %e, "BIS check failed permanently for this run");
                        record_failure(&mut failed, &entry.key);
                    }
                }
            }
        }

        dispatch_alerts(
            self.sink,
            &DispatchContext {
                owners: &owners,
                addresses_by_owner: &addresses_by_owner,
                checked: &checked,
                changes: &changes,
                failed: &failed,
                only_owner: match scope {
                    RunScope::Owner(id) => Some(id),
                    RunScope::All => None,
                },
                global_webhook: config.webhook_url.as_deref(),
            },
        );

        info!(
            checked = checked.len(),
            status_changes = changes.status_changes.len(),
            new_complaint_batches = changes.complaint_alerts.len(),
            failed = failed.len(),
            "building monitor check completed"
        );

        Ok(RunReport {
            addresses_checked: checked.len(),
            failed_addresses: failed,
            changes,
        })
    }

    fn apply_summary(
        &self,
        key: &str,
        bis_key: &BisKey,
        cached_bin: Option<&str>,
        owner_ids: &[i64],
        summary: BisSummary,
        baseline: &HashMap<String, AddressStatus>,
        changes: &mut ChangeSet,
    ) -> Result<(), MonitorError> {
        let prior = baseline.get(key);

        // No prior row: first successful check persists the baseline and
        // reports nothing.
        let mut deltas = match prior {
            Some(old) => diff_status(old, &summary),
            None => Vec::new(),
        };

        upsert_status(self.db, key, &summary, Utc::now().naive_utc())?;

        let stored_bin = prior.and_then(|s| s.bin.as_deref());
        match (stored_bin, cached_bin) {
            (None, Some(cached)) => set_bin(self.db, key, cached)?,
            (None, None) => match self.bis.fetch_bin(bis_key) {
                Ok(Some(bin)) => {
                    info!(bin = %bin, "resolved BIN");
                    set_bin(self.db, key, &bin)?;
                }
                Ok(None) => warn!("no BIN found on property page"),
                // Best-effort lookup, outside the retry budget.
                Err(e) => warn!(error = %e, "BIN lookup failed"),
            },
            (Some(old_bin), Some(cached)) if old_bin != cached => {
                deltas.push(FieldDelta {
                    field: "BIN",
                    old: old_bin.to_string(),
                    new: cached.to_string(),
                });
                set_bin(self.db, key, cached)?;
            }
            _ => {}
        }

        if !deltas.is_empty() {
            info!(fields = deltas.len(), "status change detected");
            changes.status_changes.push(StatusChange {
                address: key.to_string(),
                deltas,
                new_totals: summary,
                owner_ids: owner_ids.to_vec(),
            });
        }
        Ok(())
    }

    fn check_complaints(
        &self,
        raw_address: &str,
        key: &str,
        owner_ids: &[i64],
        limit: u32,
        ledger: &HashSet<String>,
        changes: &mut ChangeSet,
        failed: &mut Vec<String>,
    ) -> Result<(), MonitorError> {
        let feed_key = match parse_for_feed(raw_address) {
            Ok(k) => k,
            Err(e) => {
                warn!(error = %e, "skipping 311 check, address did not parse");
                record_failure(failed, key);
                return Ok(());
            }
        };

        // Single attempt; the structured feed is expected to be reliable.
        let records = match self.feed.fetch_recent(&feed_key, limit) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "311 check failed");
                record_failure(failed, key);
                return Ok(());
            }
        };

        let new_records: Vec<_> = records
            .into_iter()
            .filter(|r| !ledger.contains(&r.incident_id))
            .collect();
        if new_records.is_empty() {
            return Ok(());
        }

        info!(count = new_records.len(), "new 311 complaints found");
        for record in &new_records {
            insert_complaint(self.db, record)?;
        }

        let last_date = new_records.iter().filter_map(|r| r.created_date.clone()).max();
        changes.complaint_alerts.push(ComplaintAlert {
            address: key.to_string(),
            last_date,
            records: new_records,
            owner_ids: owner_ids.to_vec(),
        });
        Ok(())
    }
}

fn record_failure(failed: &mut Vec<String>, key: &str) {
    if !failed.iter().any(|f| f == key) {
        failed.push(key.to_string());
    }
}
