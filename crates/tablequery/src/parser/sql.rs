//! Recursive-descent parser for the table query dialect.
//!
//! Tokens come from `sqlparser`'s tokenizer; the grammar itself is small
//! enough to be parsed directly into the crate's AST types.

use sqlparser::tokenizer::{Token, Word};
use tablequery_core::{ColumnId, ColumnType};

use crate::ast::{
    BinaryOp, BooleanFunction, CaseExpr, CastTarget, ColumnReference, Expr, FunctionCall,
    Identifier, JoinClause, JoinType, Literal, OrderByExpr, Ordering, Pagination, QueryExpression,
    QuerySpecification, SelectItem, SelectList, TableName, TableRef, UnaryOp, UnionBranch,
    WithClause, WithElement,
};
use crate::error::{ParseError, ParseResult};

use super::tokens::{is_reserved, TokenStream};

/// Parses a complete query.
///
/// # Errors
///
/// Returns an error if the text is not a single valid query.
pub fn parse_query(sql: &str) -> ParseResult<QueryExpression> {
    let mut parser = QueryParser::new(sql)?;
    let query = parser.parse_query_expression()?;
    parser.expect_end()?;
    Ok(query)
}

/// Parses a standalone expression, such as a search condition.
///
/// # Errors
///
/// Returns an error if the text is not a single valid expression.
pub fn parse_expression(sql: &str) -> ParseResult<Expr> {
    let mut parser = QueryParser::new(sql)?;
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

struct QueryParser {
    tokens: TokenStream,
}

impl QueryParser {
    fn new(sql: &str) -> ParseResult<Self> {
        Ok(Self { tokens: TokenStream::new(sql)? })
    }

    fn expect_end(&mut self) -> ParseResult<()> {
        self.tokens.consume(&Token::SemiColon);
        if self.tokens.is_at_end() {
            Ok(())
        } else {
            Err(self.tokens.unexpected("end of query"))
        }
    }

    // ========== Query structure ==========

    fn parse_query_expression(&mut self) -> ParseResult<QueryExpression> {
        let with_clause = if self.tokens.parse_keyword("WITH") {
            Some(self.parse_with_clause()?)
        } else {
            None
        };
        let body = self.parse_query_specification()?;
        let mut unions = Vec::new();
        while self.tokens.parse_keyword("UNION") {
            let all = self.tokens.parse_keyword("ALL");
            if !all {
                self.tokens.parse_keyword("DISTINCT");
            }
            unions.push(UnionBranch { all, query: self.parse_query_specification()? });
        }
        Ok(QueryExpression { with_clause, body, unions })
    }

    fn parse_with_clause(&mut self) -> ParseResult<WithClause> {
        let mut elements = vec![self.parse_with_element()?];
        while self.tokens.consume(&Token::Comma) {
            elements.push(self.parse_with_element()?);
        }
        Ok(WithClause { elements })
    }

    fn parse_with_element(&mut self) -> ParseResult<WithElement> {
        let name = self.parse_identifier()?;
        let mut columns = Vec::new();
        if self.tokens.consume(&Token::LParen) {
            columns.push(self.parse_identifier()?);
            while self.tokens.consume(&Token::Comma) {
                columns.push(self.parse_identifier()?);
            }
            self.tokens.expect(&Token::RParen)?;
        }
        self.tokens.expect_keyword("AS")?;
        self.tokens.expect(&Token::LParen)?;
        let query = self.parse_query_expression()?;
        self.tokens.expect(&Token::RParen)?;
        Ok(WithElement { name, columns, query: Box::new(query) })
    }

    fn parse_query_specification(&mut self) -> ParseResult<QuerySpecification> {
        self.tokens.expect_keyword("SELECT")?;
        let distinct = self.tokens.parse_keyword("DISTINCT");
        if !distinct {
            self.tokens.parse_keyword("ALL");
        }
        let select_list = self.parse_select_list()?;
        self.tokens.expect_keyword("FROM")?;
        let from = self.parse_table_reference()?;

        let mut spec = QuerySpecification::new(select_list, from);
        spec.distinct = distinct;
        if self.tokens.parse_keyword("DEFINING_WHERE") {
            spec.defining_where = Some(self.parse_expr()?);
        }
        if self.tokens.parse_keyword("WHERE") {
            spec.where_clause = Some(self.parse_expr()?);
        }
        if self.tokens.parse_keywords(&["GROUP", "BY"]) {
            spec.group_by = self.parse_comma_separated(Self::parse_expr)?;
        }
        if self.tokens.parse_keywords(&["ORDER", "BY"]) {
            spec.order_by = self.parse_comma_separated(Self::parse_order_by_expr)?;
        }
        if self.tokens.parse_keyword("LIMIT") {
            let limit = self.parse_additive()?;
            let offset =
                if self.tokens.parse_keyword("OFFSET") { Some(self.parse_additive()?) } else { None };
            spec.pagination = Some(Pagination { limit, offset });
        }
        Ok(spec)
    }

    fn parse_select_list(&mut self) -> ParseResult<SelectList> {
        if self.tokens.consume(&Token::Mul) {
            return Ok(SelectList::Star);
        }
        Ok(SelectList::Items(self.parse_comma_separated(Self::parse_select_item)?))
    }

    fn parse_select_item(&mut self) -> ParseResult<SelectItem> {
        let expr = self.parse_expr()?;
        let alias = self.parse_optional_alias()?;
        Ok(SelectItem { expr, alias })
    }

    /// `[AS] alias`, where an implicit alias must not be a reserved word.
    fn parse_optional_alias(&mut self) -> ParseResult<Option<Identifier>> {
        if self.tokens.parse_keyword("AS") {
            return self.parse_identifier().map(Some);
        }
        match self.tokens.peek() {
            Some(Token::Word(word)) if word.quote_style.is_some() || !is_reserved(&word.value) => {
                self.parse_identifier().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_table_reference(&mut self) -> ParseResult<TableRef> {
        let mut from = TableRef::Table(self.parse_table_name()?);
        while let Some(join_type) = self.parse_join_type() {
            let right = self.parse_table_name()?;
            self.tokens.expect_keyword("ON")?;
            let condition = self.parse_expr()?;
            from = TableRef::Join(Box::new(JoinClause::new(from, join_type, right, condition)));
        }
        Ok(from)
    }

    fn parse_join_type(&mut self) -> Option<JoinType> {
        let t = &mut self.tokens;
        if t.parse_keyword("JOIN") {
            Some(JoinType::Join)
        } else if t.parse_keywords(&["INNER", "JOIN"]) {
            Some(JoinType::Inner)
        } else if t.parse_keywords(&["LEFT", "OUTER", "JOIN"]) {
            Some(JoinType::LeftOuter)
        } else if t.parse_keywords(&["LEFT", "JOIN"]) {
            Some(JoinType::Left)
        } else if t.parse_keywords(&["RIGHT", "OUTER", "JOIN"]) {
            Some(JoinType::RightOuter)
        } else if t.parse_keywords(&["RIGHT", "JOIN"]) {
            Some(JoinType::Right)
        } else {
            None
        }
    }

    /// A table id (`syn123`, `syn123.4`) or physical name, with an optional alias.
    fn parse_table_name(&mut self) -> ParseResult<TableName> {
        let mut name = match self.tokens.next_token() {
            Some(Token::Word(Word { value, quote_style: None, .. })) if !is_reserved(&value) => {
                value
            }
            Some(other) => return Err(ParseError::InvalidTableName(other.to_string())),
            None => return Err(ParseError::UnexpectedEnd("table name".to_string())),
        };
        // The version arrives either as `.4` or as a period and a number.
        match self.tokens.peek().cloned() {
            Some(Token::Number(version, _)) if version.starts_with('.') => {
                self.tokens.next_token();
                name.push_str(&version);
            }
            Some(Token::Period) => {
                if let Some(Token::Number(version, _)) = self.tokens.peek_nth(1).cloned() {
                    self.tokens.next_token();
                    self.tokens.next_token();
                    name.push('.');
                    name.push_str(&version);
                }
            }
            _ => {}
        }
        let alias = self.parse_optional_alias()?;
        Ok(TableName { name, alias })
    }

    fn parse_order_by_expr(&mut self) -> ParseResult<OrderByExpr> {
        let expr = self.parse_expr()?;
        let ordering = if self.tokens.parse_keyword("ASC") {
            Some(Ordering::Asc)
        } else if self.tokens.parse_keyword("DESC") {
            Some(Ordering::Desc)
        } else {
            None
        };
        Ok(OrderByExpr { expr, ordering })
    }

    fn parse_comma_separated<T>(
        &mut self,
        mut parse: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![parse(self)?];
        while self.tokens.consume(&Token::Comma) {
            items.push(parse(self)?);
        }
        Ok(items)
    }

    // ========== Expressions ==========

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.tokens.parse_keyword("OR") {
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.tokens.parse_keyword("AND") {
            let right = self.parse_not()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.tokens.parse_keyword("NOT") {
            return Ok(self.parse_not()?.negate());
        }
        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> ParseResult<Expr> {
        let left = self.parse_additive()?;

        if let Some(op) = self.parse_comparison_op() {
            let right = self.parse_additive()?;
            return Ok(Expr::binary(left, op, right));
        }

        if self.tokens.parse_keyword("IS") {
            let negated = self.tokens.parse_keyword("NOT");
            let expr = Box::new(left);
            return if self.tokens.parse_keyword("NULL") {
                Ok(Expr::IsNull { expr, negated })
            } else if self.tokens.parse_keyword("TRUE") {
                Ok(Expr::IsBoolean { expr, value: true, negated })
            } else if self.tokens.parse_keyword("FALSE") {
                Ok(Expr::IsBoolean { expr, value: false, negated })
            } else {
                Err(self.tokens.unexpected("NULL, TRUE or FALSE"))
            };
        }

        let negated = self.is_negated_predicate() && self.tokens.parse_keyword("NOT");
        let expr = Box::new(left);
        if self.tokens.parse_keyword("BETWEEN") {
            let low = Box::new(self.parse_additive()?);
            self.tokens.expect_keyword("AND")?;
            let high = Box::new(self.parse_additive()?);
            return Ok(Expr::Between { expr, low, high, negated });
        }
        if self.tokens.parse_keyword("IN") {
            return self.parse_in(expr, negated);
        }
        if self.tokens.parse_keyword("LIKE") {
            let pattern = Box::new(self.parse_additive()?);
            let escape = if self.tokens.parse_keyword("ESCAPE") {
                Some(Box::new(self.parse_additive()?))
            } else {
                None
            };
            return Ok(Expr::Like { expr, pattern, escape, negated });
        }
        let like = self.tokens.peek_keyword("HAS_LIKE");
        if self.tokens.parse_keyword("HAS") || self.tokens.parse_keyword("HAS_LIKE") {
            self.tokens.expect(&Token::LParen)?;
            let list = self.parse_comma_separated(Self::parse_expr)?;
            self.tokens.expect(&Token::RParen)?;
            return Ok(Expr::Has { expr, list, like, negated });
        }
        if negated {
            return Err(self.tokens.unexpected("BETWEEN, IN, LIKE, HAS or HAS_LIKE"));
        }
        Ok(*expr)
    }

    /// `NOT` directly followed by a predicate keyword.
    fn is_negated_predicate(&self) -> bool {
        self.tokens.peek_keyword("NOT")
            && ["BETWEEN", "IN", "LIKE", "HAS", "HAS_LIKE"]
                .iter()
                .any(|kw| self.tokens.peek_nth_keyword(1, kw))
    }

    fn parse_in(&mut self, expr: Box<Expr>, negated: bool) -> ParseResult<Expr> {
        self.tokens.expect(&Token::LParen)?;
        if self.tokens.peek_keyword("SELECT") || self.tokens.peek_keyword("WITH") {
            let subquery = Box::new(self.parse_query_expression()?);
            self.tokens.expect(&Token::RParen)?;
            return Ok(Expr::InSubquery { expr, subquery, negated });
        }
        let list = self.parse_comma_separated(Self::parse_expr)?;
        self.tokens.expect(&Token::RParen)?;
        Ok(Expr::InList { expr, list, negated })
    }

    fn parse_comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match self.tokens.peek()? {
            Token::Eq | Token::DoubleEq => BinaryOp::Eq,
            Token::Neq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            _ => return None,
        };
        self.tokens.next_token();
        Some(op)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.tokens.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.tokens.next_token();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.tokens.peek() {
                Some(Token::Mul) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Mod) => BinaryOp::Mod,
                _ if self.tokens.peek_keyword("DIV") => BinaryOp::IntDiv,
                _ if self.tokens.peek_keyword("MOD") => BinaryOp::ModKeyword,
                _ => break,
            };
            self.tokens.next_token();
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.tokens.consume(&Token::Minus) {
            // A negative number stays one literal so it binds as one value.
            if let Some(Token::Number(n, _)) = self.tokens.peek().cloned() {
                self.tokens.next_token();
                return Ok(Expr::Literal(Literal::Number(format!("-{n}"))));
            }
            return Ok(Expr::unary(UnaryOp::Neg, self.parse_unary()?));
        }
        if self.tokens.consume(&Token::Plus) {
            return Ok(Expr::unary(UnaryOp::Plus, self.parse_unary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(token) = self.tokens.peek().cloned() else {
            return Err(self.tokens.unexpected("expression"));
        };
        match token {
            Token::Number(n, _) => {
                self.tokens.next_token();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            Token::SingleQuotedString(s) => {
                self.tokens.next_token();
                Ok(Expr::string(s))
            }
            Token::Colon => {
                self.tokens.next_token();
                match self.tokens.next_token() {
                    Some(Token::Word(word)) => Ok(Expr::Parameter(word.value)),
                    _ => Err(ParseError::InvalidLiteral("bind parameter name".to_string())),
                }
            }
            Token::Placeholder(p) if p.starts_with(':') && p.len() > 1 => {
                self.tokens.next_token();
                Ok(Expr::Parameter(p[1..].to_string()))
            }
            Token::LParen => {
                self.tokens.next_token();
                let expr = self.parse_expr()?;
                self.tokens.expect(&Token::RParen)?;
                Ok(expr.nested())
            }
            Token::Word(word) if word.quote_style.is_some() => {
                Ok(Expr::Column(self.parse_column_reference()?))
            }
            Token::Word(word) => self.parse_word_expression(&word.value),
            _ => Err(self.tokens.unexpected("expression")),
        }
    }

    /// An expression starting with an unquoted word: keyword literal,
    /// special form, function call, or column reference.
    fn parse_word_expression(&mut self, word: &str) -> ParseResult<Expr> {
        let upper = word.to_ascii_uppercase();
        let is_call = matches!(self.tokens.peek_nth(1), Some(Token::LParen));
        match upper.as_str() {
            "NULL" => {
                self.tokens.next_token();
                Ok(Expr::null())
            }
            "TRUE" | "FALSE" => {
                self.tokens.next_token();
                Ok(Expr::Literal(Literal::Boolean(upper == "TRUE")))
            }
            "CASE" => {
                self.tokens.next_token();
                self.parse_case()
            }
            "CURRENT_USER" => {
                self.tokens.next_token();
                if self.tokens.consume(&Token::LParen) {
                    self.tokens.expect(&Token::RParen)?;
                }
                Ok(Expr::CurrentUser)
            }
            "CAST" if is_call => {
                self.tokens.next_token();
                self.parse_cast()
            }
            "ISNAN" | "ISINFINITY" if is_call => {
                self.tokens.next_token();
                let function =
                    if upper == "ISNAN" { BooleanFunction::IsNaN } else { BooleanFunction::IsInfinity };
                let column = self.parse_parenthesized(Self::parse_column_reference)?;
                Ok(Expr::BooleanFunction { function, column })
            }
            "TEXT_MATCHES" if is_call => {
                self.tokens.next_token();
                let text = self.parse_parenthesized(Self::parse_expr)?;
                Ok(Expr::TextMatches(Box::new(text)))
            }
            "UNNEST" if is_call => {
                self.tokens.next_token();
                Ok(Expr::Unnest(self.parse_parenthesized(Self::parse_column_reference)?))
            }
            "MATCH" if is_call => {
                self.tokens.next_token();
                self.parse_parenthesized(Self::parse_identifier)?;
                self.tokens.expect_keyword("AGAINST")?;
                let value = self.parse_parenthesized(Self::parse_expr)?;
                Ok(Expr::MatchAgainst(Box::new(value)))
            }
            _ if is_reserved(word) => Err(self.tokens.unexpected("expression")),
            _ if is_call => {
                self.tokens.next_token();
                self.parse_function(upper)
            }
            _ => Ok(Expr::Column(self.parse_column_reference()?)),
        }
    }

    fn parse_parenthesized<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.tokens.expect(&Token::LParen)?;
        let inner = parse(self)?;
        self.tokens.expect(&Token::RParen)?;
        Ok(inner)
    }

    fn parse_function(&mut self, name: String) -> ParseResult<Expr> {
        self.tokens.expect(&Token::LParen)?;
        let mut call = FunctionCall::new(name, vec![]);
        if self.tokens.consume(&Token::RParen) {
            return Ok(Expr::Function(call));
        }
        if self.tokens.consume(&Token::Mul) {
            call.args.push(Expr::Wildcard);
        } else {
            call.distinct = self.tokens.parse_keyword("DISTINCT");
            call.args = self.parse_comma_separated(Self::parse_expr)?;
        }
        self.tokens.expect(&Token::RParen)?;
        Ok(Expr::Function(call))
    }

    fn parse_cast(&mut self) -> ParseResult<Expr> {
        self.tokens.expect(&Token::LParen)?;
        let expr = Box::new(self.parse_expr()?);
        self.tokens.expect_keyword("AS")?;
        let target = match self.tokens.next_token() {
            Some(Token::Number(n, _)) => {
                let id = n.parse::<u64>().map_err(|_| ParseError::InvalidLiteral(n.clone()))?;
                CastTarget::ColumnId(ColumnId::new(id))
            }
            Some(Token::Word(word)) => match word.value.parse::<ColumnType>() {
                Ok(column_type) => CastTarget::Type(column_type),
                Err(_) => CastTarget::Physical(word.value.to_ascii_uppercase()),
            },
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "type name or column id".to_string(),
                    found: other.to_string(),
                })
            }
            None => return Err(ParseError::UnexpectedEnd("type name or column id".to_string())),
        };
        self.tokens.expect(&Token::RParen)?;
        Ok(Expr::Cast { expr, target })
    }

    fn parse_case(&mut self) -> ParseResult<Expr> {
        let operand =
            if self.tokens.peek_keyword("WHEN") { None } else { Some(Box::new(self.parse_expr()?)) };
        let mut when_clauses = Vec::new();
        while self.tokens.parse_keyword("WHEN") {
            let when = self.parse_expr()?;
            self.tokens.expect_keyword("THEN")?;
            let then = self.parse_expr()?;
            when_clauses.push((when, then));
        }
        if when_clauses.is_empty() {
            return Err(self.tokens.unexpected("WHEN"));
        }
        let else_result =
            if self.tokens.parse_keyword("ELSE") { Some(Box::new(self.parse_expr()?)) } else { None };
        self.tokens.expect_keyword("END")?;
        Ok(Expr::Case(CaseExpr { operand, when_clauses, else_result }))
    }

    fn parse_column_reference(&mut self) -> ParseResult<ColumnReference> {
        let first = self.parse_identifier()?;
        if self.tokens.consume(&Token::Period) {
            let name = self.parse_identifier()?;
            return Ok(ColumnReference { qualifier: Some(first), name });
        }
        Ok(ColumnReference { qualifier: None, name: first })
    }

    fn parse_identifier(&mut self) -> ParseResult<Identifier> {
        match self.tokens.peek() {
            Some(Token::Word(word)) => {
                let identifier = Identifier { name: word.value.clone(), quote_style: word.quote_style };
                self.tokens.next_token();
                Ok(identifier)
            }
            Some(Token::DoubleQuotedString(name)) => {
                let identifier = Identifier::quoted(name.clone(), '"');
                self.tokens.next_token();
                Ok(identifier)
            }
            _ => Err(self.tokens.unexpected("identifier")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(sql: &str) -> String {
        parse_query(sql).unwrap().to_string()
    }

    #[test]
    fn parse_simple_select() {
        let query = parse_query("select foo, bar from syn123 where foo = 1").unwrap();
        assert!(query.with_clause.is_none());
        assert!(!query.is_union());
        let SelectList::Items(items) = &query.body.select_list else { panic!("expected items") };
        assert_eq!(items.len(), 2);
        assert_eq!(query.body.from, TableRef::table("syn123"));
        assert_eq!(query.to_string(), "SELECT foo, bar FROM syn123 WHERE foo = 1");
    }

    #[test]
    fn parse_versioned_table() {
        let query = parse_query("select * from syn123.4").unwrap();
        assert_eq!(query.body.from, TableRef::table("syn123.4"));
        assert_eq!(query.body.select_list, SelectList::Star);
    }

    #[test]
    fn parse_table_alias() {
        let query = parse_query("select a.foo from syn1 a").unwrap();
        assert_eq!(query.body.from, TableRef::Table(TableName::aliased("syn1", "a")));
        assert_eq!(query.to_string(), "SELECT a.foo FROM syn1 a");
    }

    #[test]
    fn parse_joins() {
        assert_eq!(
            roundtrip("select * from syn1 a left outer join syn2 b on (a.foo = b.bar) join syn3 c on a.x=c.x"),
            "SELECT * FROM syn1 a LEFT OUTER JOIN syn2 b ON ( a.foo = b.bar ) JOIN syn3 c ON a.x = c.x"
        );
    }

    #[test]
    fn parse_union() {
        let query = parse_query("select foo from syn1 union all select bar from syn2 union select x from syn3").unwrap();
        assert_eq!(query.unions.len(), 2);
        assert!(query.unions[0].all);
        assert!(!query.unions[1].all);
    }

    #[test]
    fn parse_with_clause() {
        let query = parse_query("with T2 (a, b) as (select x, y from syn1) select a from T2").unwrap();
        let with = query.with_clause.as_ref().unwrap();
        assert_eq!(with.elements.len(), 1);
        assert_eq!(with.elements[0].columns.len(), 2);
        assert_eq!(query.to_string(), "WITH T2 (a, b) AS (SELECT x, y FROM syn1) SELECT a FROM T2");
    }

    #[test]
    fn parse_clauses_in_order() {
        assert_eq!(
            roundtrip(
                "select foo, count(*) from syn1 defining_where bar > 1 where foo is not null \
                 group by foo order by foo desc, 2 limit 10 offset 5"
            ),
            "SELECT foo, COUNT(*) FROM syn1 DEFINING_WHERE bar > 1 WHERE foo IS NOT NULL \
             GROUP BY foo ORDER BY foo DESC, 2 LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn parse_select_aliases() {
        let query = parse_query("select foo as f, bar b, \"baz\" from syn1").unwrap();
        let SelectList::Items(items) = &query.body.select_list else { panic!("expected items") };
        assert_eq!(items[0].alias, Some(Identifier::new("f")));
        assert_eq!(items[1].alias, Some(Identifier::new("b")));
        assert_eq!(items[2].alias, None);
        assert_eq!(items[2].expr, Expr::Column(ColumnReference::simple(Identifier::quoted("baz", '"'))));
    }

    #[test]
    fn parse_quoted_identifiers() {
        assert_eq!(
            roundtrip("select \"has space\", `back tick` from syn1 where \"has\"\"quote\" = 'a''b'"),
            "SELECT \"has space\", `back tick` FROM syn1 WHERE \"has\"\"quote\" = 'a''b'"
        );
    }

    #[test]
    fn parse_predicates() {
        assert_eq!(
            roundtrip(
                "select * from syn1 where a between 1 and 2 and b not in (1, 2) or c like 'x%' escape '!'"
            ),
            "SELECT * FROM syn1 WHERE a BETWEEN 1 AND 2 AND b NOT IN ( 1, 2 ) OR c LIKE 'x%' ESCAPE '!'"
        );
        assert_eq!(
            roundtrip("select * from syn1 where tags not has ('a','b') and tags has_like ('c%')"),
            "SELECT * FROM syn1 WHERE tags NOT HAS ( 'a', 'b' ) AND tags HAS_LIKE ( 'c%' )"
        );
        assert_eq!(
            roundtrip("select * from syn1 where flag is not true and x is false"),
            "SELECT * FROM syn1 WHERE flag IS NOT TRUE AND x IS FALSE"
        );
    }

    #[test]
    fn parse_special_functions() {
        assert_eq!(
            roundtrip(
                "select unnest(tags), current_user() from syn1 where isNaN(d) or not isInfinity(d) \
                 and text_matches('foo')"
            ),
            "SELECT UNNEST(tags), CURRENT_USER() FROM syn1 WHERE isNaN(d) OR NOT isInfinity(d) \
             AND TEXT_MATCHES('foo')"
        );
    }

    #[test]
    fn parse_cast_targets() {
        let expr = parse_expression("cast(foo as integer)").unwrap();
        assert!(matches!(expr, Expr::Cast { target: CastTarget::Type(ColumnType::Integer), .. }));
        let expr = parse_expression("cast(foo as 777)").unwrap();
        assert!(matches!(expr, Expr::Cast { target: CastTarget::ColumnId(id), .. } if id == ColumnId::new(777)));
        let expr = parse_expression("cast(foo as signed)").unwrap();
        assert_eq!(expr.to_string(), "CAST(foo AS SIGNED)");
    }

    #[test]
    fn parse_case_expressions() {
        assert_eq!(
            parse_expression("case when a > 1 then 'x' else 'y' end").unwrap().to_string(),
            "CASE WHEN a > 1 THEN 'x' ELSE 'y' END"
        );
        assert_eq!(
            parse_expression("case a when 1 then 2 end").unwrap().to_string(),
            "CASE a WHEN 1 THEN 2 END"
        );
    }

    #[test]
    fn parse_arithmetic_precedence() {
        let expr = parse_expression("a + b * 2 div 3").unwrap();
        let Expr::BinaryOp { op, right, .. } = &expr else { panic!("expected binary") };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.as_ref(), Expr::BinaryOp { op: BinaryOp::IntDiv, .. }));
        assert_eq!(expr.to_string(), "a+b*2 DIV 3");
    }

    #[test]
    fn parse_negative_number() {
        assert_eq!(parse_expression("-1").unwrap(), Expr::Literal(Literal::Number("-1".to_string())));
        assert_eq!(parse_expression("-foo").unwrap().to_string(), "-foo");
    }

    #[test]
    fn parse_set_functions() {
        let expr = parse_expression("count(distinct foo, bar)").unwrap();
        let Expr::Function(call) = &expr else { panic!("expected function") };
        assert!(call.distinct);
        assert_eq!(call.args.len(), 2);
        assert_eq!(expr.to_string(), "COUNT(DISTINCT foo, bar)");
    }

    #[test]
    fn parse_parameters() {
        assert_eq!(parse_expression(":b0").unwrap(), Expr::Parameter("b0".to_string()));
    }

    #[test]
    fn parse_in_subquery() {
        assert_eq!(
            roundtrip("select * from T1 where ROW_ID in (select ROW_ID_REF_C1_ from T1_INDEX_C1_)"),
            "SELECT * FROM T1 WHERE ROW_ID IN ( SELECT ROW_ID_REF_C1_ FROM T1_INDEX_C1_ )"
        );
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(parse_query(""), Err(ParseError::EmptyQuery)));
        assert!(matches!(parse_query("select from"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse_query("select foo"), Err(ParseError::UnexpectedEnd(_))));
        assert!(parse_query("select foo from syn1 where").is_err());
        assert!(parse_query("select foo from syn1 extra tokens").is_err());
        assert!(parse_query("select 'unterminated from syn1").is_err());
        assert!(matches!(parse_query("select foo from 123"), Err(ParseError::InvalidTableName(_))));
    }
}
