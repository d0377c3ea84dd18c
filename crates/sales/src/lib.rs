//! Sales domain: sale records, invoice numbering and the sale workflow.
//!
//! `SaleWorkflow` is the only place that mutates stock on behalf of a sale.
//! It talks to storage exclusively through `SaleStore`, whose units of work
//! make each sale (and each status change) commit or fail as a whole.

pub mod invoice;
pub mod sale;
pub mod store;
pub mod workflow;

pub use invoice::{InvoiceNumberGenerator, RandomInvoiceNumbers, SequentialInvoiceNumbers};
pub use sale::{Sale, SaleItem, SaleLine, SaleStatus, TransitionEffect};
pub use store::{SaleRecorder, SaleStore, SaleUnitOfWork};
pub use workflow::SaleWorkflow;
