//! Recursive-descent parser producing `QueryDescriptor`s.
//!
//! The parser only checks grammar. Entity columns and literal types are
//! checked later by `compile`.
//!
//! # Invariants
//! - `and`/`or` chains are kept flat, so their length never adds recursion.
//! - `not` and parenthesis nesting stops at `MAX_EXPR_DEPTH`.
//! - One filter holds at most `MAX_PREDICATES` comparisons.

use super::lexer::{tokenize, Token};
use super::schema::QueryEntity;
use super::{QueryError, QueryResult};
use chrono::{Duration, NaiveDate};

/// Deepest `not` / parenthesis nesting accepted in a filter.
pub const MAX_EXPR_DEPTH: usize = 64;
/// Most comparisons accepted in one filter.
pub const MAX_PREDICATES: usize = 256;

/// Parsed form of one query line.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub entity: QueryEntity,
    pub filter: Option<Expr>,
    /// Empty means every column of `entity`.
    pub projection: Vec<SelectItem>,
    pub group_by: Option<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Two or more operands.
    And(Vec<Expr>),
    /// Two or more operands.
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    IsNull {
        field: String,
        negated: bool,
    },
    InList {
        field: String,
        values: Vec<Literal>,
        negated: bool,
    },
    Between {
        field: String,
        low: Literal,
        high: Literal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Field(String),
    /// `field == None` stands for `*`.
    Aggregate {
        func: AggregateFn,
        field: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Parses one query line. `today` anchors the date helpers.
pub fn parse_query(input: &str, today: NaiveDate) -> QueryResult<QueryDescriptor> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        today,
        depth: 0,
        predicates: 0,
    };
    let descriptor = parser.query()?;
    if let Some(token) = parser.peek() {
        return Err(QueryError::Syntax(format!("unexpected {token} after query")));
    }
    Ok(descriptor)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    today: NaiveDate,
    depth: usize,
    predicates: usize,
}

impl Parser {
    fn query(&mut self) -> QueryResult<QueryDescriptor> {
        let entity_name = self.ident("entity name")?;
        let entity =
            QueryEntity::parse(&entity_name).ok_or(QueryError::UnknownEntity(entity_name))?;

        let filter = if self.eat_keyword("where") {
            Some(self.or_expr()?)
        } else {
            None
        };

        let mut projection = Vec::new();
        if self.eat_keyword("select") {
            projection.push(self.select_item()?);
            while self.eat(&Token::Comma) {
                projection.push(self.select_item()?);
            }
        }

        let group_by = if self.eat_keyword("group") {
            self.expect_keyword("by")?;
            Some(self.ident("group by field")?)
        } else {
            None
        };

        let order_by = if self.eat_keyword("order") {
            self.expect_keyword("by")?;
            let field = self.ident("order by field")?;
            let descending = if self.eat_keyword("desc") {
                true
            } else {
                self.eat_keyword("asc");
                false
            };
            Some(OrderBy { field, descending })
        } else {
            None
        };

        let limit = if self.eat_keyword("limit") {
            match self.next() {
                Some(Token::Integer(value)) => Some(u32::try_from(value).map_err(|_| {
                    QueryError::Syntax(format!("limit must be between 0 and {}", u32::MAX))
                })?),
                other => return Err(unexpected("limit count", other)),
            }
        } else {
            None
        };

        Ok(QueryDescriptor {
            entity,
            filter,
            projection,
            group_by,
            order_by,
            limit,
        })
    }

    fn select_item(&mut self) -> QueryResult<SelectItem> {
        let name = self.ident("select item")?;
        if self.peek() != Some(&Token::LParen) {
            return Ok(SelectItem::Field(name));
        }

        let func = AggregateFn::parse(&name)
            .ok_or_else(|| QueryError::Syntax(format!("unknown aggregate `{name}`")))?;
        self.expect(&Token::LParen)?;
        let field = if self.eat(&Token::Star) {
            None
        } else {
            Some(self.ident("aggregate field")?)
        };
        self.expect(&Token::RParen)?;
        Ok(SelectItem::Aggregate { func, field })
    }

    fn or_expr(&mut self) -> QueryResult<Expr> {
        let mut operands = vec![self.and_expr()?];
        while self.eat_keyword("or") {
            operands.push(self.and_expr()?);
        }
        Ok(flatten(operands, Expr::Or))
    }

    fn and_expr(&mut self) -> QueryResult<Expr> {
        let mut operands = vec![self.unary()?];
        while self.eat_keyword("and") {
            operands.push(self.unary()?);
        }
        Ok(flatten(operands, Expr::And))
    }

    fn unary(&mut self) -> QueryResult<Expr> {
        if self.eat_keyword("not") {
            self.descend()?;
            let inner = self.unary();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        if self.eat(&Token::LParen) {
            self.descend()?;
            let inner = self.or_expr();
            self.depth -= 1;
            let inner = inner?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }
        self.predicates += 1;
        if self.predicates > MAX_PREDICATES {
            return Err(QueryError::Invalid(format!(
                "filter has more than {MAX_PREDICATES} conditions"
            )));
        }
        self.comparison()
    }

    fn descend(&mut self) -> QueryResult<()> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(QueryError::Invalid(format!(
                "filter nests deeper than {MAX_EXPR_DEPTH} levels"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn comparison(&mut self) -> QueryResult<Expr> {
        let field = self.ident("field name")?;

        if self.eat_keyword("is") {
            let negated = self.eat_keyword("not");
            self.expect_keyword("null")?;
            return Ok(Expr::IsNull { field, negated });
        }

        let negated = self.eat_keyword("not");
        if self.eat_keyword("in") {
            self.expect(&Token::LParen)?;
            let mut values = vec![self.literal()?];
            while self.eat(&Token::Comma) {
                values.push(self.literal()?);
            }
            self.expect(&Token::RParen)?;
            return Ok(Expr::InList {
                field,
                values,
                negated,
            });
        }
        if negated {
            return Err(unexpected("`in` after `not`", self.peek().cloned()));
        }

        if self.eat_keyword("between") {
            let low = self.literal()?;
            self.expect_keyword("and")?;
            let high = self.literal()?;
            return Ok(Expr::Between { field, low, high });
        }

        let op = if self.eat_keyword("like") {
            CompareOp::Like
        } else {
            match self.next() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::Ne) => CompareOp::Ne,
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                other => return Err(unexpected("comparison operator", other)),
            }
        };
        let value = self.literal()?;
        Ok(Expr::Compare { field, op, value })
    }

    fn literal(&mut self) -> QueryResult<Literal> {
        match self.next() {
            Some(Token::Integer(value)) => Ok(Literal::Integer(value)),
            Some(Token::Decimal(value)) => Ok(Literal::Decimal(value)),
            Some(Token::Text(value)) => Ok(Literal::Text(value)),
            Some(Token::Ident(name)) => self.named_literal(&name),
            other => Err(unexpected("value", other)),
        }
    }

    fn named_literal(&mut self, name: &str) -> QueryResult<Literal> {
        match name.to_ascii_lowercase().as_str() {
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            "null" => Err(QueryError::Syntax(
                "compare against null with `is null` / `is not null`".to_string(),
            )),
            "today" => {
                self.expect(&Token::LParen)?;
                self.expect(&Token::RParen)?;
                Ok(Literal::Date(self.today))
            }
            "date" => {
                self.expect(&Token::LParen)?;
                let text = match self.next() {
                    Some(Token::Text(text)) => text,
                    other => return Err(unexpected("date string", other)),
                };
                self.expect(&Token::RParen)?;
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(Literal::Date)
                    .map_err(|err| QueryError::Syntax(format!("invalid date `{text}`: {err}")))
            }
            "days_ago" => {
                self.expect(&Token::LParen)?;
                let days = match self.next() {
                    Some(Token::Integer(days)) => days,
                    other => return Err(unexpected("day count", other)),
                };
                self.expect(&Token::RParen)?;
                Duration::try_days(days)
                    .and_then(|offset| self.today.checked_sub_signed(offset))
                    .map(Literal::Date)
                    .ok_or_else(|| QueryError::Syntax(format!("days_ago({days}) is out of range")))
            }
            _ => Err(QueryError::Syntax(format!(
                "unknown value `{name}`; quote text values"
            ))),
        }
    }

    fn ident(&mut self, expected: &str) -> QueryResult<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(unexpected(expected, other)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, token: &Token) -> QueryResult<()> {
        if self.eat(token) {
            return Ok(());
        }
        Err(unexpected(&token.to_string(), self.peek().cloned()))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(name)) if name.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> QueryResult<()> {
        if self.eat_keyword(keyword) {
            return Ok(());
        }
        Err(unexpected(&format!("`{keyword}`"), self.peek().cloned()))
    }
}

/// A one-operand chain is just its operand.
fn flatten(mut operands: Vec<Expr>, chain: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return only;
        }
    }
    chain(operands)
}

fn unexpected(expected: &str, found: Option<Token>) -> QueryError {
    match found {
        Some(token) => QueryError::Syntax(format!("expected {expected}, found {token}")),
        None => QueryError::Syntax(format!("expected {expected}, found end of query")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_query, AggregateFn, CompareOp, Expr, Literal, OrderBy, SelectItem, MAX_EXPR_DEPTH,
        MAX_PREDICATES,
    };
    use crate::query::schema::QueryEntity;
    use crate::query::QueryError;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).expect("valid date")
    }

    #[test]
    fn parses_full_clause_chain() {
        let descriptor = parse_query(
            "Employees where age > 30 and active = true select dep_id, avg(salary) group by dep_id order by dep_id desc limit 5",
            today(),
        )
        .expect("query should parse");

        assert_eq!(descriptor.entity, QueryEntity::Employees);
        assert!(matches!(descriptor.filter, Some(Expr::And(ref operands)) if operands.len() == 2));
        assert_eq!(
            descriptor.projection,
            vec![
                SelectItem::Field("dep_id".to_string()),
                SelectItem::Aggregate {
                    func: AggregateFn::Avg,
                    field: Some("salary".to_string()),
                },
            ]
        );
        assert_eq!(descriptor.group_by.as_deref(), Some("dep_id"));
        assert_eq!(
            descriptor.order_by,
            Some(OrderBy {
                field: "dep_id".to_string(),
                descending: true,
            })
        );
        assert_eq!(descriptor.limit, Some(5));
    }

    #[test]
    fn or_binds_looser_than_and() {
        let descriptor =
            parse_query("employees where age < 25 or age > 50 and active = false", today())
                .expect("query should parse");
        match descriptor.filter {
            Some(Expr::Or(operands)) => {
                assert_eq!(operands.len(), 2);
                assert!(matches!(operands[0], Expr::Compare { op: CompareOp::Lt, .. }));
                assert!(matches!(operands[1], Expr::And(_)));
            }
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn date_helpers_resolve_against_today() {
        let descriptor = parse_query(
            "employees where hire_date between days_ago(30) and today()",
            today(),
        )
        .expect("query should parse");
        match descriptor.filter {
            Some(Expr::Between { low, high, .. }) => {
                assert_eq!(
                    low,
                    Literal::Date(NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"))
                );
                assert_eq!(high, Literal::Date(today()));
            }
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_entity_and_trailing_tokens() {
        assert!(matches!(
            parse_query("salaries", today()),
            Err(QueryError::UnknownEntity(_))
        ));
        assert!(matches!(
            parse_query("employees limit 3 extra", today()),
            Err(QueryError::Syntax(_))
        ));
    }

    #[test]
    fn null_comparison_requires_is_null() {
        assert!(parse_query("employees where email = null", today()).is_err());
        let descriptor =
            parse_query("employees where email is not null", today()).expect("should parse");
        assert_eq!(
            descriptor.filter,
            Some(Expr::IsNull {
                field: "email".to_string(),
                negated: true,
            })
        );
    }

    #[test]
    fn long_chains_stay_flat() {
        let query = format!("employees where id = 1{}", " or id = 2".repeat(9));
        match parse_query(&query, today()).expect("chain should parse").filter {
            Some(Expr::Or(operands)) => assert_eq!(operands.len(), 10),
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn nesting_is_capped() {
        let at_limit = format!(
            "employees where {}id = 1",
            "not ".repeat(MAX_EXPR_DEPTH)
        );
        parse_query(&at_limit, today()).expect("nesting at the limit parses");

        let too_deep = format!(
            "employees where {}id = 1{}",
            "(".repeat(MAX_EXPR_DEPTH + 1),
            ")".repeat(MAX_EXPR_DEPTH + 1)
        );
        assert!(matches!(
            parse_query(&too_deep, today()),
            Err(QueryError::Invalid(message)) if message.contains("deeper")
        ));
    }

    #[test]
    fn condition_count_is_capped() {
        let at_limit = format!(
            "employees where id = 1{}",
            " and id = 1".repeat(MAX_PREDICATES - 1)
        );
        parse_query(&at_limit, today()).expect("chain at the limit parses");

        let too_many = format!("{at_limit} or id = 2");
        assert!(matches!(
            parse_query(&too_many, today()),
            Err(QueryError::Invalid(message)) if message.contains("conditions")
        ));
    }
}
