use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{multispace0, space1, u32},
    combinator::{all_consuming, map, value},
    error::ParseError,
    sequence::{delimited, separated_pair},
    IResult, Parser,
};

use crate::spawner::Request;

/// One line typed at the console.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Quit,
    None,
    Info,
    Req(Request),
}

fn nullary<'a, F: FnMut() -> O, O>(
    keyword: &'static str,
    mut f: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    map(tag(keyword), move |_| f())
}

fn unary<'a, O1, O2, E, F, G>(
    keyword: &'static str,
    inner: F,
    mut f: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, O2, E>
where
    E: ParseError<&'a str>,
    F: Parser<&'a str, O1, E>,
    G: FnMut(O1) -> O2,
{
    map(separated_pair(tag(keyword), space1, inner), move |(_, o1)| {
        f(o1)
    })
}

fn request(input: &str) -> IResult<&str, Request> {
    alt((
        nullary("step", || Request::Step),
        nullary("stop", || Request::Stop),
        nullary("reset", || Request::Reset),
        unary("start", u32, Request::Start),
    ))(input)
}

pub fn command(input: &str) -> IResult<&str, Command> {
    all_consuming(delimited(
        multispace0,
        alt((
            value(Command::Quit, tag(":q")),
            value(Command::Info, tag("info")),
            map(request, Command::Req),
            value(Command::None, multispace0),
        )),
        multispace0,
    ))(input)
}
