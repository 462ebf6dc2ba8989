// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filter Syntax Trees
//!
//! Two tree shapes live here. The *concrete* tree ([`TopLevel`],
//! [`FilterExpr`], [`UnaryExpr`]) comes straight out of the parser and
//! preserves grouping and negated parentheses. [`TopLevel::normalise`]
//! rewrites it into the *normalised* tree ([`Ast`]): disjunctive normal
//! form with negations pushed into the leaves, no parentheses, and no
//! nested operators of the same kind.
//!
//! Normalisation and inversion are mutually recursive: inverting an OR
//! produces an AND of negated parentheses, and normalising a negated
//! parenthesis inverts its body before flattening it.

use arkiv_core::{Value, is_case_insensitive_attribute};

// ============================================================================
// Concrete tree (parser output)
// ============================================================================

/// A whole filter: an expression, or the universal match (`$all` / `*`).
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    All,
    Expr(FilterExpr),
}

/// Expression root: a disjunction.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub or: OrExpr,
}

/// `A || B || ...` - one or more disjuncts.
#[derive(Debug, Clone, PartialEq)]
pub struct OrExpr {
    pub terms: Vec<AndExpr>,
}

/// `A && B && ...` - one or more conjuncts.
#[derive(Debug, Clone, PartialEq)]
pub struct AndExpr {
    pub terms: Vec<UnaryExpr>,
}

/// A conjunct: a leaf predicate or a (possibly negated) parenthesised group.
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryExpr {
    Paren {
        negated: bool,
        inner: Box<FilterExpr>,
    },
    Leaf(Leaf),
}

/// A leaf predicate over a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Eq {
        var: String,
        negate: bool,
        value: Value,
    },
    Lt {
        var: String,
        value: Value,
    },
    Le {
        var: String,
        value: Value,
    },
    Gt {
        var: String,
        value: Value,
    },
    Ge {
        var: String,
        value: Value,
    },
    Glob {
        var: String,
        negate: bool,
        pattern: String,
    },
    In {
        var: String,
        negate: bool,
        values: InList,
    },
}

/// Homogeneous value list of an `IN` predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    Strings(Vec<String>),
    Numbers(Vec<u64>),
}

impl InList {
    pub fn is_string(&self) -> bool {
        matches!(self, InList::Strings(_))
    }

    pub fn len(&self) -> usize {
        match self {
            InList::Strings(v) => v.len(),
            InList::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Normalised tree (DNF)
// ============================================================================

/// A normalised filter: the universal predicate, or an OR of ANDs of leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Empty,
    Dnf(DnfOr),
}

/// OR of one or more conjunctions.
#[derive(Debug, Clone, PartialEq)]
pub struct DnfOr {
    pub terms: Vec<DnfAnd>,
}

/// AND of one or more leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct DnfAnd {
    pub terms: Vec<Leaf>,
}

// ============================================================================
// Normalisation
// ============================================================================

impl TopLevel {
    /// Rewrite into disjunctive normal form.
    pub fn normalise(&self) -> Ast {
        match self {
            TopLevel::All => Ast::Empty,
            TopLevel::Expr(expr) => Ast::Dnf(expr.normalise()),
        }
    }
}

impl FilterExpr {
    fn normalise(&self) -> DnfOr {
        let mut terms = Vec::new();
        for and in &self.or.terms {
            terms.extend(and.normalise());
        }
        DnfOr { terms }
    }

    /// The logical negation, with De Morgan applied one level down.
    ///
    /// `!(A1 || ... || An)` becomes `(!A1) && ... && (!An)` with each
    /// negated disjunct wrapped in a parenthesis; a single disjunct needs no
    /// wrapping and is returned directly.
    fn invert(&self) -> FilterExpr {
        if self.or.terms.len() == 1 {
            return FilterExpr {
                or: self.or.terms[0].invert(),
            };
        }

        let conjuncts = self
            .or
            .terms
            .iter()
            .map(|and| UnaryExpr::Paren {
                negated: false,
                inner: Box::new(FilterExpr { or: and.invert() }),
            })
            .collect();

        FilterExpr {
            or: OrExpr {
                terms: vec![AndExpr { terms: conjuncts }],
            },
        }
    }
}

impl AndExpr {
    /// Normalise this conjunction into a disjunction of flat conjunctions.
    ///
    /// Each conjunct is first normalised into a disjunction of leaf
    /// sequences; the conjunction of those disjunctions is then expanded by
    /// the Cartesian product, distributing the AND over the nested ORs.
    /// Product order is stable: factors left-to-right, rows top-to-bottom.
    fn normalise(&self) -> Vec<DnfAnd> {
        let factors: Vec<Vec<Vec<Leaf>>> =
            self.terms.iter().map(UnaryExpr::to_disjunction).collect();

        let mut product: Vec<Vec<Leaf>> = vec![Vec::new()];
        for factor in &factors {
            let mut next = Vec::with_capacity(product.len() * factor.len());
            for row in &product {
                for terms in factor {
                    let mut combined = row.clone();
                    combined.extend(terms.iter().cloned());
                    next.push(combined);
                }
            }
            product = next;
        }

        product
            .into_iter()
            .map(|terms| DnfAnd { terms })
            .collect()
    }

    /// `!(u1 && ... && un)` as `!u1 || ... || !un`.
    fn invert(&self) -> OrExpr {
        OrExpr {
            terms: self
                .terms
                .iter()
                .map(|unary| AndExpr {
                    terms: vec![unary.invert()],
                })
                .collect(),
        }
    }
}

impl UnaryExpr {
    /// Flatten into an OR of leaf sequences, resolving negated parentheses.
    fn to_disjunction(&self) -> Vec<Vec<Leaf>> {
        match self {
            UnaryExpr::Leaf(leaf) => vec![vec![leaf.normalise()]],
            UnaryExpr::Paren { negated, inner } => {
                let expr = if *negated { inner.invert() } else { (**inner).clone() };
                expr.normalise()
                    .terms
                    .into_iter()
                    .map(|and| and.terms)
                    .collect()
            }
        }
    }

    fn invert(&self) -> UnaryExpr {
        match self {
            UnaryExpr::Paren { negated, inner } => UnaryExpr::Paren {
                negated: !negated,
                inner: inner.clone(),
            },
            UnaryExpr::Leaf(leaf) => UnaryExpr::Leaf(leaf.invert()),
        }
    }
}

impl Leaf {
    pub fn var(&self) -> &str {
        match self {
            Leaf::Eq { var, .. }
            | Leaf::Lt { var, .. }
            | Leaf::Le { var, .. }
            | Leaf::Gt { var, .. }
            | Leaf::Ge { var, .. }
            | Leaf::Glob { var, .. }
            | Leaf::In { var, .. } => var,
        }
    }

    /// The logical negation of this predicate.
    ///
    /// Negated equality, glob and inclusion flip their flag; ordered
    /// comparisons flip the operator instead (`< ↔ >=`, `<= ↔ >`).
    pub fn invert(&self) -> Leaf {
        match self.clone() {
            Leaf::Eq { var, negate, value } => Leaf::Eq {
                var,
                negate: !negate,
                value,
            },
            Leaf::Lt { var, value } => Leaf::Ge { var, value },
            Leaf::Le { var, value } => Leaf::Gt { var, value },
            Leaf::Gt { var, value } => Leaf::Le { var, value },
            Leaf::Ge { var, value } => Leaf::Lt { var, value },
            Leaf::Glob {
                var,
                negate,
                pattern,
            } => Leaf::Glob {
                var,
                negate: !negate,
                pattern,
            },
            Leaf::In {
                var,
                negate,
                values,
            } => Leaf::In {
                var,
                negate: !negate,
                values,
            },
        }
    }

    /// Lower-case string values of case-insensitive meta-attributes.
    ///
    /// Glob patterns are left untouched: the store lower-cases stored
    /// values, not the patterns matched against them.
    fn normalise(&self) -> Leaf {
        if !is_case_insensitive_attribute(self.var()) {
            return self.clone();
        }

        match self.clone() {
            Leaf::Eq { var, negate, value } => Leaf::Eq {
                var,
                negate,
                value: value.to_lowercase(),
            },
            Leaf::Lt { var, value } => Leaf::Lt {
                var,
                value: value.to_lowercase(),
            },
            Leaf::Le { var, value } => Leaf::Le {
                var,
                value: value.to_lowercase(),
            },
            Leaf::Gt { var, value } => Leaf::Gt {
                var,
                value: value.to_lowercase(),
            },
            Leaf::Ge { var, value } => Leaf::Ge {
                var,
                value: value.to_lowercase(),
            },
            leaf @ Leaf::Glob { .. } => leaf,
            Leaf::In {
                var,
                negate,
                values,
            } => Leaf::In {
                var,
                negate,
                values: match values {
                    InList::Strings(v) => {
                        InList::Strings(v.into_iter().map(|s| s.to_lowercase()).collect())
                    }
                    numbers => numbers,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::Parser;

    fn normalise(input: &str) -> Ast {
        Parser::parse(input).unwrap().normalise()
    }

    fn eq(var: &str, value: impl Into<Value>) -> Leaf {
        Leaf::Eq {
            var: var.to_string(),
            negate: false,
            value: value.into(),
        }
    }

    fn neq(var: &str, value: impl Into<Value>) -> Leaf {
        Leaf::Eq {
            var: var.to_string(),
            negate: true,
            value: value.into(),
        }
    }

    fn dnf(conjunctions: Vec<Vec<Leaf>>) -> Ast {
        Ast::Dnf(DnfOr {
            terms: conjunctions
                .into_iter()
                .map(|terms| DnfAnd { terms })
                .collect(),
        })
    }

    #[test]
    fn test_all_is_empty() {
        assert_eq!(normalise("$all"), Ast::Empty);
        assert_eq!(normalise("*"), Ast::Empty);
    }

    #[test]
    fn test_single_leaf() {
        assert_eq!(
            normalise(r#"name = "test\"2""#),
            dnf(vec![vec![eq("name", "test\"2")]])
        );
    }

    #[test]
    fn test_negated_disjunction_becomes_conjunction() {
        // !(name = 123 || name = 456) => name != 123 && name != 456
        assert_eq!(
            normalise("!(name = 123 || name = 456)"),
            dnf(vec![vec![neq("name", 123u64), neq("name", 456u64)]])
        );
    }

    #[test]
    fn test_negated_comparison_flips_operator() {
        assert_eq!(
            normalise("!(name < 123)"),
            dnf(vec![vec![Leaf::Ge {
                var: "name".to_string(),
                value: Value::from(123u64),
            }]])
        );
        assert_eq!(
            normalise("!(name >= 123)"),
            dnf(vec![vec![Leaf::Lt {
                var: "name".to_string(),
                value: Value::from(123u64),
            }]])
        );
    }

    #[test]
    fn test_negated_conjunction_becomes_disjunction() {
        assert_eq!(
            normalise(r#"!(a = 1 && b = "x")"#),
            dnf(vec![vec![neq("a", 1u64)], vec![neq("b", "x")]])
        );
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(normalise("!(!(a = 1))"), normalise("a = 1"));
        assert_eq!(
            normalise("!(!(a = 1 || b = 2))"),
            normalise("a = 1 || b = 2")
        );
        assert_eq!(
            normalise(r#"!(!(a = 1 && b = "x"))"#),
            normalise(r#"a = 1 && b = "x""#)
        );
    }

    #[test]
    fn test_nested_parentheses_distribution() {
        // (n1=1 || (n2=2 && (n3=3 && (n5=5 || n4=4))))
        //   => [n1=1] | [n2=2, n3=3, n5=5] | [n2=2, n3=3, n4=4]
        assert_eq!(
            normalise("(n1 = 1 || (n2 = 2 && (n3 = 3 && (n5 = 5 || n4 = 4))))"),
            dnf(vec![
                vec![eq("n1", 1u64)],
                vec![eq("n2", 2u64), eq("n3", 3u64), eq("n5", 5u64)],
                vec![eq("n2", 2u64), eq("n3", 3u64), eq("n4", 4u64)],
            ])
        );
    }

    #[test]
    fn test_distribution_order_is_stable() {
        // (a=1 || b=2) && (c=3 && d=4) || e=5
        //   => [a,c,d] | [b,c,d] | [e]
        assert_eq!(
            normalise("(a = 1 || b = 2) && (c = 3 && d = 4) || e = 5"),
            dnf(vec![
                vec![eq("a", 1u64), eq("c", 3u64), eq("d", 4u64)],
                vec![eq("b", 2u64), eq("c", 3u64), eq("d", 4u64)],
                vec![eq("e", 5u64)],
            ])
        );
    }

    #[test]
    fn test_duplicate_leaves_survive() {
        // A && (A || B) => [A, A] | [A, B]; no deduplication.
        assert_eq!(
            normalise("a = 1 && (a = 1 || b = 2)"),
            dnf(vec![
                vec![eq("a", 1u64), eq("a", 1u64)],
                vec![eq("a", 1u64), eq("b", 2u64)],
            ])
        );
    }

    #[test]
    fn test_meta_attribute_lowercased() {
        let addr = format!("0x{}", "AA".repeat(20));
        let lowered = addr.to_lowercase();
        assert_eq!(
            normalise(&format!("$owner = {}", addr)),
            dnf(vec![vec![eq("$owner", lowered.as_str())]])
        );
    }

    #[test]
    fn test_meta_attribute_in_list_lowercased() {
        assert_eq!(
            normalise(r#"$creator IN ("0xAB", "0xCD")"#),
            dnf(vec![vec![Leaf::In {
                var: "$creator".to_string(),
                negate: false,
                values: InList::Strings(vec!["0xab".to_string(), "0xcd".to_string()]),
            }]])
        );
    }

    #[test]
    fn test_plain_attribute_not_lowercased() {
        assert_eq!(
            normalise(r#"name = "MixedCase""#),
            dnf(vec![vec![eq("name", "MixedCase")]])
        );
    }

    #[test]
    fn test_glob_pattern_not_lowercased() {
        assert_eq!(
            normalise(r#"$owner ~ "0xAB*""#),
            dnf(vec![vec![Leaf::Glob {
                var: "$owner".to_string(),
                negate: false,
                pattern: "0xAB*".to_string(),
            }]])
        );
    }

    #[test]
    fn test_deep_negation_mix() {
        // !(a < 1 || !(b = "x" && b != "y"))
        //   = !(a < 1) && (b = "x" && b != "y")
        //   = [a >= 1, b = "x", b != "y"]
        assert_eq!(
            normalise(r#"!(a < 1 || !(b = "x" && b != "y"))"#),
            dnf(vec![vec![
                Leaf::Ge {
                    var: "a".to_string(),
                    value: Value::from(1u64),
                },
                eq("b", "x"),
                neq("b", "y"),
            ]])
        );
    }

    #[test]
    fn test_no_parens_in_output() {
        fn assert_flat(ast: &Ast) {
            if let Ast::Dnf(or) = ast {
                assert!(!or.terms.is_empty());
                for and in &or.terms {
                    assert!(!and.terms.is_empty());
                }
            }
        }
        for filter in [
            "a = 1",
            "!(a = 1 || (b = 2 && !(c = 3)))",
            "(a = 1 || b = 2) && (c = 3 || d = 4) && e = 5",
        ] {
            assert_flat(&normalise(filter));
        }
    }
}
