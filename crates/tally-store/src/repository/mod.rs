//! # Repository Module
//!
//! One repository per table.
//!
//! ## Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Console command                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (typed API: Product, Customer, SalesLogEntry)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RecordStore (untyped rows: field name → text)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  data/*.csv                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod customer;
pub mod product;
pub mod sales;
