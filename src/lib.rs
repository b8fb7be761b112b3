//! # add-rs: Algebraic Decision Diagrams in Rust
//!
//! **`add-rs`** is a manager-centric library for **Algebraic Decision Diagrams
//! (ADDs)**, also known as multi-terminal BDDs: canonical, shared graphs
//! representing functions from boolean variables to numbers.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the
//!   [`AddManager`][crate::manager::AddManager], which hash-conses nodes so
//!   that equal functions are equal handles.
//! - **Counted handles**: results come back as
//!   [`Diagram`][crate::diagram::Diagram]s, which keep their nodes alive
//!   across garbage collection and release them on drop.
//! - **Abstraction**: sum, product, or, min, min-excluding-zero and max over
//!   any set of variables, see [`abstraction`].
//! - **Witnesses**: min/max representatives pick, for every assignment of
//!   the remaining variables, one assignment of the abstracted variables that
//!   attains the extremum, see [`representative`].
//! - **Reordering-safe**: a reorder fired by garbage collection in the middle
//!   of an operation makes that operation restart transparently, see
//!   [`reorder`].
//! - **1-Based Indexing**: variables are 1-indexed, like the rest of the
//!   `bdd-rs` family.
//!
//! ## Basic Usage
//!
//! ```rust
//! use add_rs::manager::AddManager;
//! use add_rs::types::Var;
//!
//! let mgr = AddManager::default();
//! let (x1, x2) = (Var::new(1), Var::new(2));
//!
//! // f(x1, x2) = 3, 5, 2, 2
//! let f = mgr
//!     .tabulate(&[x1, x2], |a| match (a[0], a[1]) {
//!         (false, false) => 3.0,
//!         (false, true) => 5.0,
//!         _ => 2.0,
//!     })
//!     .unwrap();
//! let cube = mgr.cube([x2]).unwrap();
//!
//! let best = mgr.min_abstract(&f, &cube).unwrap();
//! assert_eq!(mgr.eval(&best, |_| false), 3.0);
//! assert_eq!(mgr.eval(&best, |v| v == x1), 2.0);
//!
//! // Minimizers: x2 = 0 in both cases (the tie at x1 = 1 goes to false).
//! let witness = mgr.min_representative(&f, &cube).unwrap();
//! assert_eq!(mgr.eval(&witness, |_| false), 1.0);
//! assert_eq!(mgr.eval(&witness, |v| v == x2), 0.0);
//! ```

pub mod abstraction;
pub mod apply;
pub mod cache;
pub mod config;
pub mod count;
pub mod diagram;
pub mod dot;
pub mod error;
pub mod manager;
pub mod node;
pub mod reference;
pub mod reorder;
pub mod representative;
pub mod storage;
pub mod subtable;
pub mod types;
