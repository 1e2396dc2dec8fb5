pub mod factory;
pub mod interface;
pub mod providers;

pub use factory::{build_backend, supported_backend_keys, BackendFactoryOutput};
pub use interface::{
    CreateTicketRequest, HelpdeskBackend, LoginOutcome, LoginRequest, RegisterBuildingRequest,
    RegisterCustomerRequest, RegisterWorkerRequest, UpdateTicketRequest,
};
pub use providers::demo::DemoHelpdeskBackend;
pub use providers::http::{HttpBackendConfig, HttpHelpdeskBackend};
