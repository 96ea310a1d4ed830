//! Folds a token stream into one SQL predicate.

use crate::collection::SearchContext;
use crate::collection::store::{SqlArg, Store};
use crate::error::FinderResult;
use crate::search::commands::{self, Clause, Command};
use crate::search::field_combination;
use crate::search::tokenizer::Token;

/// A compiled search: SQL boolean text plus the values for its `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

/// Accumulator threaded through the fold over tokens.
///
/// `negate_next` and `disjoin_next` apply to the next emitted clause only.
/// Once `invalid` is set the predicate text is frozen.
#[derive(Debug, Default)]
pub struct ExpressionState {
    pub negate_next: bool,
    pub disjoin_next: bool,
    pub needs_connective: bool,
    pub predicate: String,
    pub invalid: bool,
}

impl ExpressionState {
    /// Appends a clause, parenthesised.
    pub fn push(&mut self, clause: Clause) {
        self.push_with(clause, true);
    }

    fn push_with(&mut self, clause: Clause, wrap: bool) {
        if self.invalid {
            return;
        }
        let sql = match clause {
            Clause::Skip => return,
            Clause::Sql(sql) if !sql.is_empty() => sql,
            Clause::Sql(_) | Clause::Invalid => {
                // negating a term that matches nothing leaves nothing to negate
                if self.negate_next {
                    self.negate_next = false;
                } else {
                    self.invalid = true;
                }
                return;
            }
        };

        if self.needs_connective {
            if self.disjoin_next {
                self.predicate.push_str(" or ");
                self.disjoin_next = false;
            } else {
                self.predicate.push_str(" and ");
            }
        }
        if self.negate_next {
            self.predicate.push_str(" not ");
            self.negate_next = false;
        }
        if wrap {
            self.predicate.push('(');
            self.predicate.push_str(&sql);
            self.predicate.push(')');
        } else {
            self.predicate.push_str(&sql);
        }
        self.needs_connective = true;
    }

    /// Opens a group. The first term inside it takes no connective.
    pub fn open_group(&mut self) {
        self.push_with(Clause::Sql("(".to_string()), false);
        self.needs_connective = false;
    }

    pub fn close_group(&mut self) {
        if !self.invalid {
            self.predicate.push(')');
        }
    }
}

/// Builds the predicate for `tokens`, or `None` if any term is invalid.
///
/// Field terms are collected during the pass and resolved together at the
/// end, then appended as the last term.
pub(crate) async fn build_predicate(
    tokens: &[Token],
    ctx: &SearchContext<'_>,
    store: &Store,
) -> FinderResult<Option<Predicate>> {
    let mut state = ExpressionState::default();
    let mut args: Vec<SqlArg> = Vec::new();
    let mut field_terms: Vec<(String, String)> = Vec::new();

    for token in tokens {
        if state.invalid {
            return Ok(None);
        }
        match token {
            Token::Negate => state.negate_next = true,
            Token::Disjoin => state.disjoin_next = true,
            Token::Group => state.open_group(),
            Token::GroupEnd => state.close_group(),
            Token::Command { key, value } => match Command::parse(key) {
                Some(command) => {
                    let clause = commands::interpret(command, value, ctx, store, &mut args).await?;
                    state.push(clause);
                }
                None => field_terms.push((key.clone(), value.clone())),
            },
            Token::Text(text) => {
                let clause = commands::find_text(text, &mut args);
                state.push(clause);
            }
        }
    }

    if !field_terms.is_empty() && !state.invalid {
        let clause = field_combination::find_fields(&field_terms, ctx.models, store).await?;
        state.push(clause);
    }

    if state.invalid {
        return Ok(None);
    }
    Ok(Some(Predicate {
        sql: state.predicate,
        args,
    }))
}
