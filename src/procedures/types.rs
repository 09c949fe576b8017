use std::fmt;

/// the C-level type of a summary argument or return value. only as much of C's type system as
/// argument marshaling needs: how wide a value is, and whether it is a pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimType {
    Void,
    Char,
    Int { bits: u32, signed: bool },
    SizeT,
    Pointer(Box<SimType>),
    /// a pointer to a NUL-terminated `char` array.
    String,
}

impl SimType {
    /// C `int`.
    pub fn int() -> SimType {
        SimType::Int { bits: 32, signed: true }
    }

    pub fn pointer_to(ty: SimType) -> SimType {
        SimType::Pointer(Box::new(ty))
    }

    /// width in bits on a machine with `word_bits`-bit pointers. `None` for `void`.
    pub fn bits(&self, word_bits: u32) -> Option<u32> {
        match self {
            SimType::Void => None,
            SimType::Char => Some(8),
            SimType::Int { bits, .. } => Some(*bits),
            SimType::SizeT |
            SimType::Pointer(_) |
            SimType::String => Some(word_bits),
        }
    }

    pub fn is_pointer(&self) -> bool {
        match self {
            SimType::Pointer(_) | SimType::String => true,
            _ => false,
        }
    }
}

impl fmt::Display for SimType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimType::Void => write!(f, "void"),
            SimType::Char => write!(f, "char"),
            SimType::Int { bits: 32, signed: true } => write!(f, "int"),
            SimType::Int { bits, signed: true } => write!(f, "int{}_t", bits),
            SimType::Int { bits, signed: false } => write!(f, "uint{}_t", bits),
            SimType::SizeT => write!(f, "size_t"),
            SimType::Pointer(inner) => write!(f, "{}*", inner),
            SimType::String => write!(f, "char*"),
        }
    }
}

/// a summary's C prototype, minus the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub args: Vec<SimType>,
    pub ret: SimType,
}

impl Signature {
    pub fn new(args: Vec<SimType>, ret: SimType) -> Signature {
        Signature { args, ret }
    }

    pub fn render(&self, name: &str) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        format!("{} {}({})", self.ret, name, args.join(", "))
    }
}
