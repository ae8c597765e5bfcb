#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
// We allow expect since it forces good error messages at the least.
#![allow(clippy::expect_used)]

#[macro_use]
extern crate tracing;

include!("../opt/outreach.rs");

pub mod common;
pub mod entry;
pub mod session;

impl OutreachClientOpt {
    pub fn debug(&self) -> bool {
        match self {
            OutreachClientOpt::Login(lopt) => lopt.debug(),
            OutreachClientOpt::Logout(lopt) => lopt.debug(),
            OutreachClientOpt::Whoami(copt) => copt.debug,
            OutreachClientOpt::List(lopt) => lopt.copt.debug,
            OutreachClientOpt::Add(aopt) => aopt.copt.debug,
            OutreachClientOpt::Edit(eopt) => eopt.copt.debug,
            OutreachClientOpt::Delete(dopt) => dopt.copt.debug,
            OutreachClientOpt::Categories(copt) => copt.debug,
        }
    }

    pub async fn exec(&self) {
        match self {
            OutreachClientOpt::Login(lopt) => lopt.exec().await,
            OutreachClientOpt::Logout(lopt) => lopt.exec().await,
            OutreachClientOpt::Whoami(copt) => session::whoami(copt).await,
            OutreachClientOpt::List(lopt) => lopt.exec().await,
            OutreachClientOpt::Add(aopt) => aopt.exec().await,
            OutreachClientOpt::Edit(eopt) => eopt.exec().await,
            OutreachClientOpt::Delete(dopt) => dopt.exec().await,
            OutreachClientOpt::Categories(copt) => entry::categories(copt),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        OutreachClientParser::command().debug_assert();
    }

    #[test]
    fn test_parse_list() {
        let opt = OutreachClientParser::try_parse_from([
            "outreach", "list", "-P", "demo", "--sort", "desc", "-o", "json",
        ])
        .expect("parse");
        match opt.commands {
            OutreachClientOpt::List(lopt) => {
                assert_eq!(lopt.sort, Some(SortDirection::Desc));
                assert_eq!(lopt.copt.project_id.as_deref(), Some("demo"));
                assert!(matches!(lopt.copt.output_mode, OutputMode::Json));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_edit_fields() {
        let opt = OutreachClientParser::try_parse_from([
            "outreach", "edit", "abc123", "--category", "Keynote",
        ])
        .expect("parse");
        match opt.commands {
            OutreachClientOpt::Edit(eopt) => {
                assert_eq!(eopt.id, "abc123");
                assert_eq!(eopt.fields.category.as_deref(), Some("Keynote"));
                assert!(!eopt.fields.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
