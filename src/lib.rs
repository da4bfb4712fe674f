//! # perl5-base
//!
//! Core library for Perl 5 parsing, typed syntax trees, and declaration
//! stub indexing.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! index     → StubIndexRegistry, per-file StubIndex, Indexer
//!   ↓
//! stubs     → PerlStub, stub element types, binary codec, stub-backed PSI
//!   ↓
//! psi       → ElementFactory, typed wrappers, PerlVisitor
//!   ↓
//! parser    → Logos lexer, recursive-descent parser, rowan CST
//!   ↓
//! base      → Primitives (FileId, LineIndex, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → psi → stubs → index)
// ============================================================================

/// Foundation types: FileId, LineIndex, TextRange
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, syntax kinds
pub mod parser;

/// PSI: typed wrappers over syntax nodes, element factory, visitor
pub mod psi;

/// Stubs: detached declaration summaries and their persisted form
pub mod stubs;

/// Index: stub storage and lookup, file indexing
pub mod index;

// Re-export foundation types
pub use base::{FileId, LineCol, LineIndex, TextRange, TextSize};
