//! Recursive-descent parser producing predicate trees.
//!
//! The parser resolves bare words against the symbol table, decodes literals
//! against the declared type of the field they are compared with, and
//! rejects operator/type combinations the comparators do not implement. A
//! tree that leaves this module is guaranteed interpretable: the evaluator
//! re-checks none of this.

use std::net::Ipv4Addr;

use compact_str::CompactString;

use super::ast::{ByteRange, CompareOp, LogicalOp, PredicateNode};
use super::lexer::Token;
use crate::field::{FieldId, FieldRegistry, FieldType, FieldValue, SymbolTable};

/// A relation operand before literal decoding.
///
/// Words and quoted strings stay raw until we know the field type they are
/// paired with; `00:50` is a MAC prefix next to an ether field but a plain
/// byte string next to a bytes field.
enum Operand {
    Field {
        field: FieldId,
        ftype: FieldType,
        scope: Option<FieldId>,
        range: Option<ByteRange>,
        name: CompactString,
    },
    Word(String),
    Quoted(String),
}

pub(crate) struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a FieldRegistry,
    symbols: &'a SymbolTable,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: Vec<Token>,
        registry: &'a FieldRegistry,
        symbols: &'a SymbolTable,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            registry,
            symbols,
        }
    }

    /// Parse the whole token stream into one predicate tree.
    pub(crate) fn parse(mut self) -> Result<PredicateNode, String> {
        let node = self.parse_or()?;
        match self.peek() {
            None => Ok(node),
            Some(token) => Err(format!("unexpected {} after expression", describe(token))),
        }
    }

    fn parse_or(&mut self) -> Result<PredicateNode, String> {
        let mut node = self.parse_xor()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_xor()?;
            node = logical(LogicalOp::Or, node, rhs);
        }
        Ok(node)
    }

    fn parse_xor(&mut self) -> Result<PredicateNode, String> {
        let mut node = self.parse_and()?;
        while self.eat(&Token::Xor) {
            let rhs = self.parse_and()?;
            node = logical(LogicalOp::Xor, node, rhs);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<PredicateNode, String> {
        let mut node = self.parse_unary()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_unary()?;
            node = logical(LogicalOp::And, node, rhs);
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<PredicateNode, String> {
        if self.eat(&Token::Not) {
            let child = self.parse_unary()?;
            return Ok(PredicateNode::Logical {
                op: LogicalOp::Not,
                lhs: Box::new(child),
                rhs: None,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<PredicateNode, String> {
        if self.eat(&Token::LParen) {
            let node = self.parse_or()?;
            if !self.eat(&Token::RParen) {
                return Err("expected ')'".into());
            }
            return Ok(node);
        }

        let lhs = self.parse_operand()?;
        match self.peek_compare_op() {
            Some(op) => {
                self.pos += 1;
                let rhs = self.parse_operand()?;
                self.make_relation(op, lhs, rhs)
            }
            None => self.make_bare(lhs),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, String> {
        match self.next().cloned() {
            Some(Token::Word(word)) => match self.symbols.lookup(&word) {
                Some(field) => self.finish_field_operand(field, word),
                None => Ok(Operand::Word(word)),
            },
            Some(Token::Quoted(s)) => Ok(Operand::Quoted(s)),
            Some(token) => Err(format!("expected field or value, found {}", describe(&token))),
            None => Err("expected field or value at end of filter".into()),
        }
    }

    fn finish_field_operand(&mut self, field: FieldId, name: String) -> Result<Operand, String> {
        let descriptor = self.registry.descriptor(field);
        let ftype = descriptor.ftype;
        let scope = if descriptor.is_protocol {
            Some(field)
        } else {
            descriptor.parent
        };

        let range = if self.eat(&Token::LBracket) {
            if ftype != FieldType::Bytes {
                return Err(format!("'{name}' is not a bytes field, cannot take a range"));
            }
            let range = self.parse_range()?;
            if !self.eat(&Token::RBracket) {
                return Err("expected ']' after byte range".into());
            }
            Some(range)
        } else {
            None
        };

        Ok(Operand::Field {
            field,
            ftype,
            scope,
            range,
            name: CompactString::new(name),
        })
    }

    fn parse_range(&mut self) -> Result<ByteRange, String> {
        let word = match self.next().cloned() {
            Some(Token::Word(word)) => word,
            _ => return Err("expected offset:length inside '[ ]'".into()),
        };
        let (offset, length) = word
            .split_once(':')
            .ok_or_else(|| "expected offset:length inside '[ ]'".to_string())?;
        let offset: usize = offset
            .parse()
            .map_err(|_| format!("bad range offset '{offset}'"))?;
        let length: usize = length
            .parse()
            .map_err(|_| format!("bad range length '{length}'"))?;
        if length == 0 {
            return Err("byte range length must be at least 1".into());
        }
        Ok(ByteRange { offset, length })
    }

    /// Build a relation, decoding raw literals against the field type they
    /// are paired with and checking operator admissibility.
    fn make_relation(
        &self,
        op: CompareOp,
        lhs: Operand,
        rhs: Operand,
    ) -> Result<PredicateNode, String> {
        let (lhs, rhs) = match (lhs, rhs) {
            (lhs @ Operand::Field { .. }, rhs @ Operand::Field { .. }) => {
                self.check_field_pair(op, &lhs, &rhs)?;
                (field_node(lhs), field_node(rhs))
            }
            (lhs @ Operand::Field { .. }, raw) => {
                let value = self.decode_against_field(op, &lhs, raw)?;
                (field_node(lhs), PredicateNode::Literal(value))
            }
            (raw, rhs @ Operand::Field { .. }) => {
                let value = self.decode_against_field(op, &rhs, raw)?;
                (PredicateNode::Literal(value), field_node(rhs))
            }
            (raw_lhs, raw_rhs) => {
                let lhs_value = infer_literal(raw_lhs)?;
                let rhs_value = decode_literal(raw_rhs, lhs_value.field_type())?;
                check_op(op, lhs_value.field_type())?;
                (
                    PredicateNode::Literal(lhs_value),
                    PredicateNode::Literal(rhs_value),
                )
            }
        };

        Ok(PredicateNode::Relation {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn check_field_pair(&self, op: CompareOp, lhs: &Operand, rhs: &Operand) -> Result<(), String> {
        let (Operand::Field {
            ftype: lhs_type,
            name: lhs_name,
            ..
        }, Operand::Field {
            ftype: rhs_type,
            name: rhs_name,
            ..
        }) = (lhs, rhs)
        else {
            unreachable!("check_field_pair called on non-field operands");
        };

        let lhs_domain = lhs_type
            .domain()
            .ok_or_else(|| format!("'{lhs_name}' has no value to compare"))?;
        let rhs_domain = rhs_type
            .domain()
            .ok_or_else(|| format!("'{rhs_name}' has no value to compare"))?;
        if lhs_domain != rhs_domain {
            return Err(format!(
                "'{lhs_name}' and '{rhs_name}' have incompatible types"
            ));
        }
        check_op(op, *lhs_type)?;
        check_op(op, *rhs_type)
    }

    fn decode_against_field(
        &self,
        op: CompareOp,
        field: &Operand,
        raw: Operand,
    ) -> Result<FieldValue, String> {
        let Operand::Field { ftype, name, .. } = field else {
            unreachable!("decode_against_field called on non-field operand");
        };
        if *ftype == FieldType::None {
            return Err(format!("'{name}' has no value to compare"));
        }
        check_op(op, *ftype)?;
        decode_literal(raw, *ftype)
    }

    /// A bare operand with no relation around it: a field reference is an
    /// existence test, a literal stands alone (and will evaluate as true).
    fn make_bare(&self, operand: Operand) -> Result<PredicateNode, String> {
        match operand {
            Operand::Field { .. } => Ok(field_node(operand)),
            raw => Ok(PredicateNode::Literal(infer_literal(raw)?)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
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

    fn peek_compare_op(&self) -> Option<CompareOp> {
        match self.peek()? {
            Token::Eq => Some(CompareOp::Eq),
            Token::NotEq => Some(CompareOp::NotEq),
            Token::Gt => Some(CompareOp::Gt),
            Token::GtEq => Some(CompareOp::GtEq),
            Token::Lt => Some(CompareOp::Lt),
            Token::LtEq => Some(CompareOp::LtEq),
            _ => None,
        }
    }
}

fn logical(op: LogicalOp, lhs: PredicateNode, rhs: PredicateNode) -> PredicateNode {
    PredicateNode::Logical {
        op,
        lhs: Box::new(lhs),
        rhs: Some(Box::new(rhs)),
    }
}

fn field_node(operand: Operand) -> PredicateNode {
    match operand {
        Operand::Field {
            field,
            ftype,
            scope,
            range,
            ..
        } => PredicateNode::FieldRef {
            field,
            ftype,
            scope,
            range,
        },
        _ => unreachable!("field_node called on non-field operand"),
    }
}

fn check_op(op: CompareOp, ftype: FieldType) -> Result<(), String> {
    if op.admissible_for(ftype) {
        Ok(())
    } else {
        Err(format!(
            "operator '{}' is not supported for this field type",
            op.symbol()
        ))
    }
}

/// Decode a raw literal as a value of the given declared type.
fn decode_literal(raw: Operand, ftype: FieldType) -> Result<FieldValue, String> {
    match raw {
        Operand::Quoted(s) => match ftype {
            FieldType::Str => Ok(FieldValue::Str(CompactString::new(s))),
            _ => Err("string literal used where a non-string value is expected".into()),
        },
        Operand::Word(word) => decode_word(&word, ftype),
        Operand::Field { .. } => unreachable!("field operands are never decoded as literals"),
    }
}

fn decode_word(word: &str, ftype: FieldType) -> Result<FieldValue, String> {
    match ftype {
        FieldType::Numeric => parse_number(word)
            .map(FieldValue::Numeric)
            .ok_or_else(|| format!("'{word}' is not a number")),
        FieldType::IpxNet => parse_number(word)
            .map(FieldValue::IpxNet)
            .ok_or_else(|| format!("'{word}' is not an IPX network number")),
        FieldType::Boolean => parse_boolean(word)
            .map(FieldValue::Boolean)
            .ok_or_else(|| format!("'{word}' is not a boolean")),
        FieldType::MacAddr => match parse_byte_string(word).as_deref() {
            Some([a, b, c, d, e, f]) => Ok(FieldValue::MacAddr([*a, *b, *c, *d, *e, *f])),
            _ => Err(format!("'{word}' is not a MAC address")),
        },
        FieldType::Bytes => parse_byte_string(word)
            .map(FieldValue::Bytes)
            .ok_or_else(|| format!("'{word}' is not a byte string")),
        FieldType::Ipv4Addr => word
            .parse::<Ipv4Addr>()
            .map(FieldValue::Ipv4Addr)
            .map_err(|_| format!("'{word}' is not an IPv4 address")),
        FieldType::Str => Err(format!("expected a quoted string, found '{word}'")),
        FieldType::AbsTime => Err("timestamps have no literal form in filters".into()),
        FieldType::None => Err(format!("'{word}' cannot be used as a value")),
    }
}

/// Decode a literal with no field to dictate its type, going by shape.
fn infer_literal(raw: Operand) -> Result<FieldValue, String> {
    let word = match raw {
        Operand::Quoted(s) => return Ok(FieldValue::Str(CompactString::new(s))),
        Operand::Word(word) => word,
        Operand::Field { .. } => unreachable!("field operands are never inferred as literals"),
    };

    if word == "true" || word == "false" {
        return Ok(FieldValue::Boolean(word == "true"));
    }
    if let Some(n) = parse_number(&word) {
        return Ok(FieldValue::Numeric(n));
    }
    if let Ok(addr) = word.parse::<Ipv4Addr>() {
        return Ok(FieldValue::Ipv4Addr(addr));
    }
    if word.contains(':') {
        if let Some(bytes) = parse_byte_string(&word) {
            return match <[u8; 6]>::try_from(bytes.as_slice()) {
                Ok(mac) => Ok(FieldValue::MacAddr(mac)),
                Err(_) => Ok(FieldValue::Bytes(bytes)),
            };
        }
    }
    Err(format!("'{word}' is not a known field or valid value"))
}

/// Parse an unsigned number: decimal, `0x` hex or `0` octal.
fn parse_number(word: &str) -> Option<u32> {
    if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if word.len() > 1 && word.starts_with('0') {
        u32::from_str_radix(&word[1..], 8).ok()
    } else {
        word.parse().ok()
    }
}

fn parse_boolean(word: &str) -> Option<bool> {
    match word {
        "true" => Some(true),
        "false" => Some(false),
        _ => parse_number(word).map(|n| n != 0),
    }
}

/// Parse a byte string: `aa:bb:cc` pairs, or bare even-length hex like
/// `aabbcc`.
fn parse_byte_string(word: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    if word.contains(':') {
        for pair in word.split(':') {
            if pair.len() != 2 {
                return None;
            }
            bytes.push(u8::from_str_radix(pair, 16).ok()?);
        }
    } else {
        if word.is_empty() || word.len() % 2 != 0 {
            return None;
        }
        for i in (0..word.len()).step_by(2) {
            bytes.push(u8::from_str_radix(word.get(i..i + 2)?, 16).ok()?);
        }
    }
    Some(bytes)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(word) => format!("'{word}'"),
        Token::Quoted(_) => "string literal".into(),
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
        Token::LBracket => "'['".into(),
        Token::RBracket => "']'".into(),
        Token::Eq => "'=='".into(),
        Token::NotEq => "'!='".into(),
        Token::Gt => "'>'".into(),
        Token::GtEq => "'>='".into(),
        Token::Lt => "'<'".into(),
        Token::LtEq => "'<='".into(),
        Token::And => "'and'".into(),
        Token::Or => "'or'".into(),
        Token::Xor => "'xor'".into(),
        Token::Not => "'not'".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::lexer::tokenize;

    struct Fixture {
        registry: FieldRegistry,
        symbols: SymbolTable,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = FieldRegistry::new();
            let eth = registry.register_protocol("Ethernet", "eth");
            registry.register_field("Source", "eth.src", FieldType::MacAddr, eth);
            let ip = registry.register_protocol("Internet Protocol", "ip");
            registry.register_field("Time to live", "ip.ttl", FieldType::Numeric, ip);
            registry.register_field("Source address", "ip.src", FieldType::Ipv4Addr, ip);
            registry.register_field("Destination address", "ip.dst", FieldType::Ipv4Addr, ip);
            registry.register_field("Fragment flag", "ip.frag", FieldType::Boolean, ip);
            let frame = registry.register_protocol("Frame", "frame");
            registry.register_field("Payload", "frame.data", FieldType::Bytes, frame);
            registry.register_field("Arrival time", "frame.time", FieldType::AbsTime, frame);
            let symbols = SymbolTable::build(&registry);
            Self { registry, symbols }
        }

        fn parse(&self, text: &str) -> Result<PredicateNode, String> {
            let tokens = tokenize(text)?;
            Parser::new(tokens, &self.registry, &self.symbols).parse()
        }
    }

    #[test]
    fn test_numeric_relation() {
        let fixture = Fixture::new();
        let node = fixture.parse("ip.ttl > 32").unwrap();

        let PredicateNode::Relation { op, lhs, rhs } = node else {
            panic!("expected relation");
        };
        assert_eq!(op, CompareOp::Gt);
        assert!(matches!(
            *lhs,
            PredicateNode::FieldRef {
                ftype: FieldType::Numeric,
                ..
            }
        ));
        assert!(matches!(
            *rhs,
            PredicateNode::Literal(FieldValue::Numeric(32))
        ));
    }

    #[test]
    fn test_literal_decoded_by_field_type() {
        let fixture = Fixture::new();

        let node = fixture.parse("ip.src == 192.168.1.1").unwrap();
        let PredicateNode::Relation { rhs, .. } = node else {
            panic!("expected relation");
        };
        assert!(matches!(*rhs, PredicateNode::Literal(FieldValue::Ipv4Addr(_))));

        let node = fixture.parse("eth.src == 00:11:22:33:44:55").unwrap();
        let PredicateNode::Relation { rhs, .. } = node else {
            panic!("expected relation");
        };
        assert!(matches!(*rhs, PredicateNode::Literal(FieldValue::MacAddr(_))));
    }

    #[test]
    fn test_literal_on_the_left() {
        let fixture = Fixture::new();
        let node = fixture.parse("32 < ip.ttl").unwrap();

        let PredicateNode::Relation { op, lhs, rhs } = node else {
            panic!("expected relation");
        };
        assert_eq!(op, CompareOp::Lt);
        assert!(matches!(
            *lhs,
            PredicateNode::Literal(FieldValue::Numeric(32))
        ));
        assert!(matches!(*rhs, PredicateNode::FieldRef { .. }));
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let fixture = Fixture::new();
        let node = fixture.parse("ip or eth and frame").unwrap();

        let PredicateNode::Logical { op, rhs, .. } = node else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Or);
        assert!(matches!(
            rhs.as_deref(),
            Some(PredicateNode::Logical {
                op: LogicalOp::And,
                ..
            })
        ));
    }

    #[test]
    fn test_parens_override_precedence() {
        let fixture = Fixture::new();
        let node = fixture.parse("(ip or eth) and frame").unwrap();

        let PredicateNode::Logical { op, lhs, .. } = node else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::And);
        assert!(matches!(
            *lhs,
            PredicateNode::Logical {
                op: LogicalOp::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_not_is_unary() {
        let fixture = Fixture::new();
        let node = fixture.parse("not ip").unwrap();

        let PredicateNode::Logical { op, rhs, .. } = node else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Not);
        assert!(rhs.is_none());
    }

    #[test]
    fn test_bare_protocol_is_field_ref() {
        let fixture = Fixture::new();
        let node = fixture.parse("ip").unwrap();

        let PredicateNode::FieldRef { scope, .. } = node else {
            panic!("expected field reference");
        };
        assert!(scope.is_some());
    }

    #[test]
    fn test_bare_literal_allowed() {
        let fixture = Fixture::new();
        let node = fixture.parse("42").unwrap();
        assert!(matches!(
            node,
            PredicateNode::Literal(FieldValue::Numeric(42))
        ));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let fixture = Fixture::new();
        let err = fixture.parse("nosuch.field == 1").unwrap_err();
        assert!(err.contains("nosuch.field"), "unexpected message: {err}");
    }

    #[test]
    fn test_protocol_not_comparable() {
        let fixture = Fixture::new();
        assert!(fixture.parse("ip == 1").is_err());
    }

    #[test]
    fn test_inadmissible_operators_rejected() {
        let fixture = Fixture::new();
        assert!(fixture.parse("eth.src > 00:11:22:33:44:55").is_err());
        assert!(fixture.parse("frame.data >= 00:11").is_err());
        assert!(fixture.parse("ip.frag < 1").is_err());
        assert!(fixture.parse("ip.src ge 192.168.1.1").is_err());
    }

    #[test]
    fn test_type_mismatch_between_fields() {
        let fixture = Fixture::new();
        assert!(fixture.parse("ip.ttl == eth.src").is_err());
        // Same comparison domain on both sides is fine
        assert!(fixture.parse("ip.src == ip.dst").is_ok());
    }

    #[test]
    fn test_timestamps_have_no_literal() {
        let fixture = Fixture::new();
        assert!(fixture.parse("frame.time == 12345").is_err());
        assert!(fixture.parse("frame.time == frame.time").is_ok());
    }

    #[test]
    fn test_byte_range_only_on_bytes() {
        let fixture = Fixture::new();

        let node = fixture.parse("frame.data[2:4] == 00:01:02:03").unwrap();
        let PredicateNode::Relation { lhs, .. } = node else {
            panic!("expected relation");
        };
        let PredicateNode::FieldRef { range, .. } = *lhs else {
            panic!("expected field reference");
        };
        assert_eq!(range, Some(ByteRange { offset: 2, length: 4 }));

        assert!(fixture.parse("ip.ttl[0:1] == 1").is_err());
        assert!(fixture.parse("frame.data[0:0] == 00").is_err());
    }

    #[test]
    fn test_number_bases() {
        let fixture = Fixture::new();
        for (text, expected) in [
            ("ip.ttl == 64", 64),
            ("ip.ttl == 0x40", 64),
            ("ip.ttl == 0100", 64),
        ] {
            let node = fixture.parse(text).unwrap();
            let PredicateNode::Relation { rhs, .. } = node else {
                panic!("expected relation");
            };
            assert!(
                matches!(*rhs, PredicateNode::Literal(FieldValue::Numeric(n)) if n == expected),
                "wrong decode for {text}"
            );
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let fixture = Fixture::new();
        assert!(fixture.parse("ip.ttl == 1 )").is_err());
        assert!(fixture.parse("ip.ttl == ").is_err());
    }
}
