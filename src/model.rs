pub mod binding;
pub mod collector;
pub mod server;

pub use binding::{Binding, BindingClass};
pub use collector::{Candidate, CandidateList, CollectRequest, Scope, WindowCollector};
pub use server::{AppId, ApplicationData, WindowData, WindowId, WorkspaceData};
