//! # ABAC Engine
//!
//! Attribute-based access control as an in-process library: a rule-text
//! parser, four-valued expression evaluation, multi-policy combining, a
//! bounded TTL decision cache, and an audit trail.
//!
//! The entry point is [`access::AccessControlManager`]; see the module docs
//! in [`access`] for the full picture.

pub mod access;
