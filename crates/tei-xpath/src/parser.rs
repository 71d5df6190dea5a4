//! Recursive-descent parser for XPath 1.0 expressions.
//!
//! Name-test prefixes are resolved against the [`NamespaceTable`] while
//! parsing, so an expression using an unknown prefix fails up front even if
//! it would never test a node.

use crate::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::{Result, XPathError};
use crate::lexer::{Spanned, Token, tokenize};
use crate::namespaces::NamespaceTable;

pub fn parse(input: &str, namespaces: &NamespaceTable) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        namespaces,
    };
    let expr = parser.expr()?;
    if let Some((token, at)) = parser.tokens.get(parser.pos) {
        return Err(XPathError::syntax(format!("unexpected {:?}", token), *at));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    namespaces: &'a NamespaceTable,
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "node" | "text" | "comment" | "processing-instruction")
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(XPathError::syntax(format!("expected {}", what), self.position()))
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        self.binary_level(0)
    }

    /// Precedence climbing over the binary operator levels, loosest first.
    fn binary_level(&mut self, level: usize) -> Result<Expr> {
        const LEVELS: &[&[(Token, BinaryOp)]] = &[
            &[(Token::Or, BinaryOp::Or)],
            &[(Token::And, BinaryOp::And)],
            &[(Token::Eq, BinaryOp::Eq), (Token::NotEq, BinaryOp::NotEq)],
            &[
                (Token::Lt, BinaryOp::Lt),
                (Token::Le, BinaryOp::Le),
                (Token::Gt, BinaryOp::Gt),
                (Token::Ge, BinaryOp::Ge),
            ],
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            &[
                (Token::Multiply, BinaryOp::Mul),
                (Token::Div, BinaryOp::Div),
                (Token::Mod, BinaryOp::Mod),
            ],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut lhs = self.binary_level(level + 1)?;
        loop {
            let Some(op) = self
                .peek()
                .and_then(|t| ops.iter().find(|(tok, _)| tok == t))
                .map(|(_, op)| *op)
            else {
                return Ok(lhs);
            };
            self.pos += 1;
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary()?)));
        }
        self.union()
    }

    fn union(&mut self) -> Result<Expr> {
        let mut lhs = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Token::Variable(_) | Token::LParen | Token::Literal(_) | Token::Number(_)) => true,
            Some(Token::Name { prefix, local }) => {
                self.peek_at(1) == Some(&Token::LParen)
                    && !(prefix.is_none() && is_node_type(local))
            }
            _ => false,
        }
    }

    fn path_expr(&mut self) -> Result<Expr> {
        if !self.starts_primary() {
            return self.location_path();
        }
        let primary = self.primary()?;
        let predicates = self.predicates()?;
        let mut steps = Vec::new();
        if matches!(self.peek(), Some(Token::Slash | Token::DoubleSlash)) {
            self.relative_steps_after_separator(&mut steps)?;
        }
        if predicates.is_empty() && steps.is_empty() {
            return Ok(primary);
        }
        Ok(Expr::Filter {
            primary: Box::new(primary),
            predicates,
            steps,
        })
    }

    fn location_path(&mut self) -> Result<Expr> {
        let mut steps = Vec::new();
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.starts_step() {
                    self.relative_path(&mut steps)?;
                }
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self_node());
                self.relative_path(&mut steps)?;
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            _ => {
                if !self.starts_step() {
                    return Err(XPathError::syntax("expected an expression", self.position()));
                }
                self.relative_path(&mut steps)?;
                Ok(Expr::Path {
                    absolute: false,
                    steps,
                })
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name { .. } | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn relative_path(&mut self, steps: &mut Vec<Step>) -> Result<()> {
        steps.push(self.step()?);
        self.relative_steps_after_separator(steps)
    }

    /// `(('/' | '//') Step)*`
    fn relative_steps_after_separator(&mut self, steps: &mut Vec<Step>) -> Result<()> {
        loop {
            match self.peek() {
                Some(Token::Slash) => self.pos += 1,
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self_node());
                }
                _ => return Ok(()),
            }
            steps.push(self.step()?);
        }
    }

    fn step(&mut self) -> Result<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::Self_,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name { prefix: None, local }), Some(Token::ColonColon)) =
            (self.peek(), self.peek_at(1))
        {
            let at = self.position();
            let name = local.clone();
            self.pos += 2;
            if name == "namespace" {
                return Err(XPathError::UnsupportedAxis(name));
            }
            Axis::from_name(&name)
                .ok_or_else(|| XPathError::syntax(format!("unknown axis '{}'", name), at))?
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest> {
        let at = self.position();
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::Name { prefix: None, local })
                if is_node_type(&local) && self.peek() == Some(&Token::LParen) =>
            {
                self.pos += 1;
                let test = match local.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => match self.peek() {
                        Some(Token::Literal(target)) => {
                            let target = target.clone();
                            self.pos += 1;
                            NodeTest::ProcessingInstruction(Some(target))
                        }
                        _ => NodeTest::ProcessingInstruction(None),
                    },
                };
                self.expect(&Token::RParen, "')'")?;
                Ok(test)
            }
            Some(Token::Name { prefix, local }) => {
                let namespace = match prefix {
                    Some(prefix) => Some(
                        self.namespaces
                            .resolve(&prefix)
                            .ok_or(XPathError::UnknownPrefix(prefix))?
                            .to_string(),
                    ),
                    None => None,
                };
                match (namespace, local.as_str()) {
                    (Some(uri), "*") => Ok(NodeTest::AnyInNamespace(uri)),
                    (namespace, _) => Ok(NodeTest::Name { namespace, local }),
                }
            }
            _ => Err(XPathError::syntax("expected a node test", at)),
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.expr()?);
            self.expect(&Token::RBracket, "']'")?;
        }
        Ok(predicates)
    }

    fn primary(&mut self) -> Result<Expr> {
        let at = self.position();
        match self.advance() {
            Some(Token::Variable(name)) => Err(XPathError::Variable(name)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Name { prefix, local }) => {
                let name = match prefix {
                    Some(prefix) => format!("{}:{}", prefix, local),
                    None => local,
                };
                self.expect(&Token::LParen, "'('")?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen, "')' or ','")?;
                        break;
                    }
                }
                Ok(Expr::Function { name, args })
            }
            _ => Err(XPathError::syntax("expected an expression", at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tei_xml::TEI_NAMESPACE;

    fn parse_default(input: &str) -> Result<Expr> {
        parse(input, &NamespaceTable::new())
    }

    fn child(local: &str) -> Step {
        Step {
            axis: Axis::Child,
            test: NodeTest::Name {
                namespace: None,
                local: local.to_string(),
            },
            predicates: Vec::new(),
        }
    }

    #[test]
    fn test_absolute_path_with_predicate() {
        let expr = parse_default("/a/b[2]").unwrap();
        let mut b = child("b");
        b.predicates.push(Expr::Number(2.0));
        assert_eq!(
            expr,
            Expr::Path {
                absolute: true,
                steps: vec![child("a"), b]
            }
        );
    }

    #[test]
    fn test_root_alone_and_double_slash() {
        assert_eq!(
            parse_default("/").unwrap(),
            Expr::Path {
                absolute: true,
                steps: vec![]
            }
        );
        let Expr::Path { steps, .. } = parse_default("//tei:p").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(steps[0], Step::descendant_or_self_node());
        assert_eq!(
            steps[1].test,
            NodeTest::Name {
                namespace: Some(TEI_NAMESPACE.to_string()),
                local: "p".to_string()
            }
        );
    }

    #[test]
    fn test_precedence() {
        let expr = parse_default("1 + 2 * 3 = 7 or false()").unwrap();
        let Expr::Binary(BinaryOp::Or, lhs, _) = expr else {
            panic!("expected or at the top");
        };
        let Expr::Binary(BinaryOp::Eq, sum, _) = *lhs else {
            panic!("expected = under or");
        };
        assert!(matches!(*sum, Expr::Binary(BinaryOp::Add, _, _)));
    }

    #[test]
    fn test_filter_expression_with_steps() {
        let expr = parse_default("(//a | //b)[1]/@n").unwrap();
        let Expr::Filter {
            primary,
            predicates,
            steps,
        } = expr
        else {
            panic!("expected filter");
        };
        assert!(matches!(*primary, Expr::Union(_, _)));
        assert_eq!(predicates, vec![Expr::Number(1.0)]);
        assert_eq!(steps[0].axis, Axis::Attribute);
    }

    #[test]
    fn test_node_type_tests_are_not_functions() {
        let Expr::Path { steps, .. } = parse_default("processing-instruction('pi')").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(steps[0].test, NodeTest::ProcessingInstruction(Some("pi".to_string())));

        let Expr::Path { steps, .. } = parse_default("a/text()").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(steps[1].test, NodeTest::Text);
        assert!(matches!(parse_default("text() | comment()").unwrap(), Expr::Union(_, _)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_default("//foo:bar").unwrap_err(),
            XPathError::UnknownPrefix("foo".to_string())
        );
        assert_eq!(
            parse_default("namespace::*").unwrap_err(),
            XPathError::UnsupportedAxis("namespace".to_string())
        );
        assert_eq!(
            parse_default("$x").unwrap_err(),
            XPathError::Variable("x".to_string())
        );
        assert!(matches!(
            parse_default("/a[").unwrap_err(),
            XPathError::Syntax { position: 3, .. }
        ));
        assert!(matches!(
            parse_default("a b").unwrap_err(),
            XPathError::Syntax { .. }
        ));
        assert!(matches!(
            parse_default("sideways::a").unwrap_err(),
            XPathError::Syntax { .. }
        ));
    }
}
