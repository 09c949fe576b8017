use std::collections::BTreeMap;

use tracing::{event, Level};

use error::Result;
use procedures::{libc, syscalls, CallingConvention, Procedure};

/// summaries by `(library, symbol)`. filled in before analysis starts and only read after that,
/// so it can be shared by reference across every path.
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: BTreeMap<(String, String), Box<dyn Procedure>>,
}

impl ProcedureRegistry {
    pub fn new() -> ProcedureRegistry {
        ProcedureRegistry::default()
    }

    /// every summary this crate ships.
    pub fn with_defaults() -> ProcedureRegistry {
        let mut registry = ProcedureRegistry::new();
        registry.register(libc::LIBRARY, "strlen", Box::new(libc::Strlen));
        registry.register(libc::LIBRARY, "puts", Box::new(libc::Puts));
        registry.register(libc::LIBRARY, "putchar", Box::new(libc::Putchar));
        registry.register(syscalls::LIBRARY, "write", Box::new(syscalls::Write));
        registry
    }

    /// register `procedure` for `library!symbol`, replacing any earlier registration.
    pub fn register(&mut self, library: &str, symbol: &str, procedure: Box<dyn Procedure>) {
        let key = (library.to_string(), symbol.to_string());
        if let Some(old) = self.procedures.insert(key, procedure) {
            event!(Level::WARN, library, symbol, replaced = old.name(), "replacing registered procedure");
        }
    }

    pub fn lookup(&self, library: &str, symbol: &str) -> Option<&dyn Procedure> {
        self.procedures
            .get(&(library.to_string(), symbol.to_string()))
            .map(|p| &**p)
    }

    /// registered symbols of `library`, in order.
    pub fn symbols<'a>(&'a self, library: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.procedures
            .keys()
            .filter(move |(lib, _)| lib == library)
            .map(|(_, sym)| sym.as_str())
    }

    /// check every summary registered under `library` against `cc`, so that a signature the
    /// convention cannot marshal is reported before any path calls it.
    pub fn check(&self, library: &str, cc: &CallingConvention) -> Result<()> {
        for ((lib, symbol), procedure) in self.procedures.iter() {
            if lib == library {
                event!(Level::TRACE, library, symbol = symbol.as_str(), convention = cc.name, "checking summary");
                cc.check(procedure.name(), &procedure.signature())?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::Error;
    use procedures::{ret, CallContext, ProcedureOutcome, Signature, SimType};
    use symbolic::SymExpr;

    struct Abort;

    impl Procedure for Abort {
        fn name(&self) -> &'static str { "abort" }
        fn signature(&self) -> Signature { Signature::new(vec![], SimType::Void) }
        fn execute(&self, _ctx: &mut CallContext, _args: &[SymExpr]) -> Result<ProcedureOutcome> {
            ret(None)
        }
    }

    #[test]
    fn defaults_are_registered() {
        let registry = ProcedureRegistry::with_defaults();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.lookup("libc.so.6", "puts").map(|p| p.name()), Some("puts"));
        assert_eq!(registry.lookup("syscalls", "write").map(|p| p.name()), Some("write"));
        assert!(registry.lookup("libc.so.6", "write").is_none());
        let libc: Vec<&str> = registry.symbols("libc.so.6").collect();
        assert_eq!(libc, vec!["putchar", "puts", "strlen"]);
    }

    struct Wide;

    impl Procedure for Wide {
        fn name(&self) -> &'static str { "wide" }
        fn signature(&self) -> Signature {
            Signature::new(vec![SimType::Int { bits: 64, signed: false }], SimType::Void)
        }
        fn execute(&self, _ctx: &mut CallContext, _args: &[SymExpr]) -> Result<ProcedureOutcome> {
            ret(None)
        }
    }

    #[test]
    fn defaults_fit_their_conventions() {
        let registry = ProcedureRegistry::with_defaults();
        assert!(registry.check("libc.so.6", &CallingConvention::amd64_sysv()).is_ok());
        assert!(registry.check("libc.so.6", &CallingConvention::x86_cdecl()).is_ok());
        assert!(registry.check("syscalls", &CallingConvention::amd64_syscall()).is_ok());
    }

    #[test]
    fn check_reports_summaries_a_convention_cannot_marshal() {
        let mut registry = ProcedureRegistry::with_defaults();
        registry.register("libc.so.6", "wide", Box::new(Wide));
        assert!(registry.check("libc.so.6", &CallingConvention::amd64_sysv()).is_ok());
        match registry.check("libc.so.6", &CallingConvention::x86_cdecl()) {
            Err(Error::SummaryArgumentMismatch { procedure, .. }) => assert_eq!(procedure, "wide"),
            other => panic!("expected an argument mismatch, got {:?}", other),
        }
        // other libraries are not affected
        assert!(registry.check("syscalls", &CallingConvention::x86_cdecl()).is_ok());
    }

    #[test]
    fn later_registrations_replace_earlier_ones() {
        let mut registry = ProcedureRegistry::with_defaults();
        registry.register("libc.so.6", "puts", Box::new(Abort));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.lookup("libc.so.6", "puts").map(|p| p.name()), Some("abort"));
    }
}
