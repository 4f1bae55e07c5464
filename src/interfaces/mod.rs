//! Interfaces to external collaborators.

pub mod document_store;

pub use document_store::{
    DocumentStore, DocumentStoreExt, OrderBy, Query, Record, Result, Scope, StoreError,
    Subscription, TxnDecision, TxnFn, TxnOutcome,
};
