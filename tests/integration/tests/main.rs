//! End-to-end flows through the handler.
//!
//! Directory traffic goes to the in-memory mock; persistence goes to a
//! file store in a temporary directory. The transport module opens real
//! sockets against the local machine only.

mod common;
mod persist_flows;
mod probe_flows;
mod test_flows;
mod transport;
