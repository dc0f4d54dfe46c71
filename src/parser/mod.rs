mod common;
mod csharp;

pub use common::{
    FlowSite, ParseResult, Parser, PreserveSink, ProtocolDemands, ScanFacts, SinkKind, TypeOfFlow,
};
pub use csharp::CSharpParser;
