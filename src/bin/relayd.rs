//! relayd - real-time WebSocket broadcast relay
//!
//! Every text message a client sends on `/ws` is relayed to every other
//! connected client. See `relayd --help` for options.

fn main() -> anyhow::Result<()> {
    relayd::cli::run()
}
