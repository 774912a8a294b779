//! # Parser Combinators
//!
//! Building blocks composed by the grammar in [`super::parsers`].
//!
//! ## Backtracking
//!
//! * [`Choice`] tries its alternatives in order and backtracks freely, except
//!   over a committed error. When all alternatives fail it reports the error
//!   that got furthest.
//! * [`Many`], [`Optional`] and [`SeparatedList`] stop quietly only
//!   when the inner parser fails without consuming anything. A failure past
//!   the start position is a real error and is propagated.
//! * [`Cut`] commits: once reached, its inner errors can no longer be
//!   backtracked over.

use super::core::ParseError;
use super::core::ParseResult;
use super::core::Parser;
use std::fmt;
use std::marker::PhantomData;

/// Matches one input element equal to `value`.
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Display> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            Some(found) => Err(ParseError::Unexpected {
                expected: self.value.to_string(),
                found: found.to_string(),
                position: pos,
                context: None,
            }),
            None => Err(ParseError::UnexpectedEOF {
                message: format!("expected {}", self.value),
                position: pos,
                context: None,
            }),
        }
    }
}

/// Consumes one element when `f` maps it to `Some`.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    I: fmt::Display,
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        match input.get(pos) {
            Some(found) => match (self.f)(found) {
                Some(result) => Ok((pos + 1, result)),
                None => Err(ParseError::Unexpected {
                    expected: "matching token".to_string(),
                    found: found.to_string(),
                    position: pos,
                    context: None,
                }),
            },
            None => Err(ParseError::UnexpectedEOF {
                message: "expected a token".to_string(),
                position: pos,
                context: None,
            }),
        }
    }
}

pub struct Choice<I, O> {
    parsers: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<Box<dyn Parser<I, O>>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let mut furthest: Option<ParseError> = None;
        for parser in &self.parsers {
            match parser.parse(input, pos) {
                Ok(result) => return Ok(result),
                Err(e) if e.is_committed() => return Err(e),
                Err(e) => {
                    let further = furthest
                        .as_ref()
                        .map_or(true, |f| e.get_position() > f.get_position());
                    if further {
                        furthest = Some(e);
                    }
                }
            }
        }
        match furthest {
            Some(e) if e.get_position() > pos => Err(e),
            _ => Err(ParseError::NoAlternative {
                position: pos,
                context: None,
            }),
        }
    }
}

#[derive(Clone)]
pub struct Preceded<P1, P2, I, O> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O)>,
}

impl<P1, P2, I, O> Preceded<P1, P2, I, O> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O> Parser<I, O> for Preceded<P1, P2, I, O>
where
    P1: Parser<I, ()>,
    P2: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.parser1.parse(input, pos)?;
        self.parser2.parse(input, pos)
    }
}

#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        self.parser
            .parse(input, pos)
            .map(|(pos, value)| (pos, (self.f)(value)))
    }
}

/// Like [`Map`], but the conversion may reject the value. The rejection is
/// reported at the position the inner parser started from.
#[derive(Clone)]
pub struct MapRes<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> MapRes<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for MapRes<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> Result<B, String>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        let (new_pos, value) = self.parser.parse(input, pos)?;
        (self.f)(value)
            .map(|value| (new_pos, value))
            .map_err(|message| ParseError::Failure {
                message,
                position: pos,
                context: None,
            })
    }
}

#[derive(Clone)]
pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        self.parser.parse(input, pos).map(|(pos, _)| (pos, ()))
    }
}

#[derive(Clone)]
pub struct Many<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        loop {
            match self.parser.parse(input, current_pos) {
                // a parser that consumes nothing would loop forever
                Ok((new_pos, _)) if new_pos == current_pos => break,
                Ok((new_pos, value)) => {
                    results.push(value);
                    current_pos = new_pos;
                }
                Err(e) if e.is_fatal_from(current_pos) => return Err(e),
                Err(_) => break,
            }
        }

        Ok((current_pos, results))
    }
}

/// Items separated by a separator, allowing a trailing separator.
pub struct SeparatedList<P, S, I, O> {
    item_parser: P,
    separator_parser: S,
    _phantom: PhantomData<(I, O)>,
}

impl<P, S, I, O> SeparatedList<P, S, I, O> {
    pub fn new(item_parser: P, separator_parser: S) -> Self {
        Self {
            item_parser,
            separator_parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, I, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();

        let mut current_pos = match self.item_parser.parse(input, pos) {
            Ok((new_pos, value)) => {
                results.push(value);
                new_pos
            }
            Err(e) if e.is_fatal_from(pos) => return Err(e),
            Err(_) => return Ok((pos, results)),
        };

        loop {
            let sep_pos = match self.separator_parser.parse(input, current_pos) {
                Ok((sep_pos, _)) => sep_pos,
                Err(e) if e.is_fatal_from(current_pos) => return Err(e),
                Err(_) => break,
            };
            current_pos = sep_pos;
            match self.item_parser.parse(input, current_pos) {
                Ok((new_pos, value)) => {
                    results.push(value);
                    current_pos = new_pos;
                }
                Err(e) if e.is_fatal_from(current_pos) => return Err(e),
                // trailing separator
                Err(_) => break,
            }
        }

        Ok((current_pos, results))
    }
}

#[derive(Clone)]
pub struct Optional<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Optional<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Option<O>> {
        match self.parser.parse(input, pos) {
            Ok((new_pos, value)) => Ok((new_pos, Some(value))),
            Err(e) if e.is_fatal_from(pos) => Err(e),
            Err(_) => Ok((pos, None)),
        }
    }
}

#[derive(Clone)]
pub struct Tuple2<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Tuple2<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        Ok((pos, (result1, result2)))
    }
}

#[derive(Clone)]
pub struct Tuple3<P1, P2, P3, I, O1, O2, O3> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    _phantom: PhantomData<(I, O1, O2, O3)>,
}

impl<P1, P2, P3, I, O1, O2, O3> Tuple3<P1, P2, P3, I, O1, O2, O3> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, I, O1, O2, O3> Parser<I, (O1, O2, O3)> for Tuple3<P1, P2, P3, I, O1, O2, O3>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        let (pos, result3) = self.parser3.parse(input, pos)?;
        Ok((pos, (result1, result2, result3)))
    }
}

#[derive(Clone)]
pub struct Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    parser4: P4,
    _phantom: PhantomData<(I, O1, O2, O3, O4)>,
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3, parser4: P4) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            parser4,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Parser<I, (O1, O2, O3, O4)>
    for Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3, O4)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        let (pos, result3) = self.parser3.parse(input, pos)?;
        let (pos, result4) = self.parser4.parse(input, pos)?;
        Ok((pos, (result1, result2, result3, result4)))
    }
}

#[derive(Clone)]
pub struct Delimited<L, P, R, I, O> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(I, O)>,
}

impl<L, P, R, I, O> Delimited<L, P, R, I, O> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, L, P, R> Parser<I, O> for Delimited<L, P, R, I, O>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, value) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, value))
    }
}

#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|e| e.with_context(&self.context.to_string()))
    }
}

/// Turns every failure of the inner parser into a committed one.
#[derive(Clone)]
pub struct Cut<P> {
    parser: P,
}

impl<P> Cut<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I, O, P> Parser<I, O> for Cut<P>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser.parse(input, pos).map_err(ParseError::commit)
    }
}

/// Builds the inner parser on use, which lets grammar rules refer to
/// themselves.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.f)().parse(input, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit(n: i32) -> Satisfy<i32, i32, impl Fn(&i32) -> Option<i32>> {
        Satisfy::new(move |x: &i32| if *x == n { Some(*x) } else { None })
    }

    #[test]
    fn test_equal() {
        let input = vec![1, 2, 3];
        assert_eq!(Equal::new(2).parse(&input, 1), Ok((2, 2)));
        assert!(matches!(
            Equal::new(2).parse(&input, 0),
            Err(ParseError::Unexpected { position: 0, .. })
        ));
        assert!(matches!(
            Equal::new(2).parse(&input, 3),
            Err(ParseError::UnexpectedEOF { position: 3, .. })
        ));
    }

    #[test]
    fn test_choice_backtracks() {
        let input = vec![1, 2, 4];
        let parser = Choice::new(vec![
            Box::new(Map::new(
                Tuple2::new(digit(1), digit(3)),
                |(a, b): (i32, i32)| a + b,
            )),
            Box::new(Map::new(
                Tuple2::new(digit(1), digit(2)),
                |(a, b): (i32, i32)| a * 10 + b,
            )),
        ]);
        assert_eq!(parser.parse(&input, 0), Ok((2, 12)));
    }

    #[test]
    fn test_choice_reports_furthest_error() {
        let input = vec![1, 2, 9];
        let parser = Choice::new(vec![
            Box::new(AsUnit::new(digit(5))),
            Box::new(AsUnit::new(Tuple3::new(digit(1), digit(2), digit(3)))),
        ]);
        let err = parser.parse(&input, 0).unwrap_err();
        assert_eq!(err.get_position(), 2);

        let err = parser.parse(&[7], 0).unwrap_err();
        assert!(matches!(err, ParseError::NoAlternative { position: 0, .. }));
    }

    #[test]
    fn test_choice_stops_at_commit() {
        let input = vec![1, 9];
        let parser = Choice::new(vec![
            Box::new(AsUnit::new(Tuple2::new(digit(1), Cut::new(digit(2))))),
            Box::new(AsUnit::new(digit(1))),
        ]);
        let err = parser.parse(&input, 0).unwrap_err();
        assert!(err.is_committed());
    }

    #[test]
    fn test_many_stops_without_consumption() {
        let input = vec![1, 1, 2];
        assert_eq!(Many::new(digit(1)).parse(&input, 0), Ok((2, vec![1, 1])));
        assert_eq!(Many::new(digit(5)).parse(&input, 0), Ok((0, vec![])));
    }

    #[test]
    fn test_many_propagates_partial_failure() {
        // "1 2" pairs, the second pair is broken after its first element
        let input = vec![1, 2, 1, 3];
        let parser = Many::new(Tuple2::new(digit(1), digit(2)));
        let err = parser.parse(&input, 0).unwrap_err();
        assert_eq!(err.get_position(), 3);
    }

    #[test]
    fn test_separated_list_trailing_separator() {
        let input = vec![1, 0, 1, 0, 7];
        let parser = SeparatedList::new(digit(1), AsUnit::new(digit(0)));
        assert_eq!(parser.parse(&input, 0), Ok((4, vec![1, 1])));

        let empty: Vec<i32> = vec![7];
        assert_eq!(parser.parse(&empty, 0), Ok((0, vec![])));
    }

    #[test]
    fn test_optional() {
        let input = vec![1, 2];
        assert_eq!(Optional::new(digit(1)).parse(&input, 0), Ok((1, Some(1))));
        assert_eq!(Optional::new(digit(2)).parse(&input, 0), Ok((0, None)));

        let committed = Optional::new(Cut::new(digit(2)));
        assert!(committed.parse(&input, 0).is_err());
    }

    #[test]
    fn test_map_res_reports_start() {
        let input = vec![1, 2];
        let parser = MapRes::new(Tuple2::new(digit(1), digit(2)), |_: (i32, i32)| {
            Err::<i32, _>("rejected".to_string())
        });
        match parser.parse(&input, 0) {
            Err(ParseError::Failure {
                message, position, ..
            }) => {
                assert_eq!(message, "rejected");
                assert_eq!(position, 0);
            }
            other => panic!("Expected Failure, got {:?}", other),
        }
    }

    #[test]
    fn test_delimited_and_context() {
        let input = vec![0, 5, 0];
        let parser = Delimited::new(AsUnit::new(digit(0)), digit(5), AsUnit::new(digit(0)));
        assert_eq!(parser.parse(&input, 0), Ok((3, 5)));

        let named = WithContext::new(digit(4), "four");
        let err = named.parse(&input, 1).unwrap_err();
        assert_eq!(err.context(), Some("four"));
    }
}
