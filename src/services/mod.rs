//! Service layer: scheduling, routing, gating, and session coordination.

pub mod coordinator;
pub mod distributor;
pub mod gates;
pub mod task_master;

pub use coordinator::SessionCoordinator;
pub use distributor::Distributor;
pub use gates::{Gate, GateAdapter, GatePipeline};
pub use task_master::TaskMaster;
