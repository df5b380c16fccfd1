//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! # yapp-calc
//!
//! The classic line-oriented calculator, built on the **yapp** LALR(1)
//! runtime. It shows the pieces a grammar needs around the engine: a lexer,
//! precomputed tables, a driver with rule actions and an error hook, and a
//! context that collects results.
//!
//! ## Modules
//!
//! - [`lexer`]: [`CalcLexer`], regex-based tokenization
//! - [`parser`]: tables, [`CalcParserDriver`], [`Calc`] and [`CalcParser`]
//! - [`symtab`]: [`SymTab`], variable bindings
//! - [`token`]: [`TokenID`] and [`TokenValue`]
//! - [`error`]: [`CalcError`]
//!
//! ## Example
//!
//! ```rust
//! use yapp_calc::{Calc, CalcParser};
//!
//! let mut calc = Calc::new();
//! let mut parser = CalcParser::try_new().unwrap();
//! parser.eval("a = 1 + 2 * 3\n(a + 1) / 2\n1 +* 2\n", &mut calc).unwrap();
//! assert_eq!(calc.results, vec![Some(7), Some(4), None]);
//! assert_eq!(calc.errors.len(), 1);
//! assert_eq!(calc.symtab.lookup("a").unwrap(), 7);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod token;

pub use error::CalcError;
pub use lexer::CalcLexer;
pub use parser::{CALC_TABLES, Calc, CalcParser, CalcParserDriver, ProdID, calc_tables};
pub use symtab::{SymTab, SymTabError};
pub use token::{TokenID, TokenValue};
