//! Self-contained succinct bit structures.
//!
//! [`RankSelect`] answers rank/select over a plain bit vector and
//! [`BalancedParens`] adds matching-parenthesis queries on top of it. Both are
//! immutable once built: structural changes rebuild them from scratch.

mod balanced_parens;
mod rank_select;

pub use balanced_parens::BalancedParens;
pub use rank_select::{Bits, RankSelect, CHECKPOINT_STRIDE};
