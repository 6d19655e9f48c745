//! Weekly newsletter: who receives it ([`ledger`]), how one run goes out ([`dispatcher`])
//! and when runs happen ([`scheduler`]).

pub mod dispatcher;
pub mod ledger;
pub mod scheduler;

pub use dispatcher::{dispatch_newsletter, run_dispatch, DispatchReport};
pub use ledger::{subscribe, unsubscribe, SubscribeOutcome};
