mod dispatch;
mod payload;
mod webhook;

pub use dispatch::{dispatch_alerts, DispatchContext};
pub use payload::{build_run_embed, Embed, EmbedField, EmbedFooter, WebhookPayload, EMBED_COLOR};
pub use webhook::{AlertSink, WebhookSink};
