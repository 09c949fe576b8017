use std::fmt;

/// an IR operator tag. widths are in bits and are always one of the integer IR widths.
///
/// parsed from (and displayed as) VEX spellings: `Iop_Add32`, `Iop_CmpLT64U`, `Iop_8Uto32`,
/// `Iop_DivModU64to32`. a well-formed name this crate does not model, floating point and vector
/// operators in particular, parses to `Other` and is rejected at translation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IROp {
    Add(u32),
    Sub(u32),
    Mul(u32),
    /// widening multiplies: two `n`-bit operands, one `2n`-bit result.
    MullS(u32),
    MullU(u32),
    DivU(u32),
    DivS(u32),
    /// `from`-bit dividend, `to`-bit divisor; result is `remainder:quotient`, `from` bits wide.
    DivModU { from: u32, to: u32 },
    DivModS { from: u32, to: u32 },
    And(u32),
    Or(u32),
    Xor(u32),
    Shl(u32),
    Shr(u32),
    Sar(u32),
    Not(u32),
    CmpEQ(u32),
    CmpNE(u32),
    CmpLTS(u32),
    CmpLTU(u32),
    CmpLES(u32),
    CmpLEU(u32),
    CmpNEZ(u32),
    Clz(u32),
    Ctz(u32),
    MaxU(u32),
    /// zero-extension, `Iop_8Uto32`.
    Uto { from: u32, to: u32 },
    /// sign-extension, `Iop_8Sto32`.
    Sto { from: u32, to: u32 },
    /// truncation to the low bits, `Iop_64to32`.
    To { from: u32, to: u32 },
    /// the high half, `Iop_64HIto32`.
    HIto { from: u32, to: u32 },
    /// concatenation of two halves, high first, `Iop_32HLto64`.
    HLto { from: u32, to: u32 },
    Other(String),
}

fn is_width(bits: u32) -> bool {
    match bits {
        1 | 8 | 16 | 32 | 64 | 128 => true,
        _ => false,
    }
}

/// splits `CmpLT32S` into `("CmpLT", 32, "S")`.
fn split_family(name: &str) -> Option<(&str, u32, &str)> {
    let digits_at = name.find(|c: char| c.is_ascii_digit())?;
    let (family, rest) = name.split_at(digits_at);
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (digits, suffix) = rest.split_at(digits_end);
    let bits = digits.parse().ok()?;
    Some((family, bits, suffix))
}

fn parse_conversion(name: &str) -> Option<IROp> {
    let (family, from, rest) = split_family(name)?;
    if !family.is_empty() {
        return None;
    }
    let (kind, to) = if rest.starts_with("Uto") {
        ("U", &rest[3..])
    } else if rest.starts_with("Sto") {
        ("S", &rest[3..])
    } else if rest.starts_with("HIto") {
        ("HI", &rest[4..])
    } else if rest.starts_with("HLto") {
        ("HL", &rest[4..])
    } else if rest.starts_with("to") {
        ("", &rest[2..])
    } else {
        return None;
    };
    let to: u32 = to.parse().ok()?;
    if !is_width(from) || !is_width(to) {
        return None;
    }
    Some(match kind {
        "U" => IROp::Uto { from, to },
        "S" => IROp::Sto { from, to },
        "HI" => IROp::HIto { from, to },
        "HL" => IROp::HLto { from, to },
        _ => IROp::To { from, to },
    })
}

fn parse_family(name: &str) -> Option<IROp> {
    let (family, bits, suffix) = split_family(name)?;
    if !is_width(bits) {
        return None;
    }
    if suffix.starts_with("to") {
        let to: u32 = suffix[2..].parse().ok()?;
        return match family {
            "DivModU" => Some(IROp::DivModU { from: bits, to }),
            "DivModS" => Some(IROp::DivModS { from: bits, to }),
            _ => None,
        };
    }
    let op = match (family, suffix) {
        ("Add", "") => IROp::Add(bits),
        ("Sub", "") => IROp::Sub(bits),
        ("Mul", "") => IROp::Mul(bits),
        ("MullS", "") => IROp::MullS(bits),
        ("MullU", "") => IROp::MullU(bits),
        ("DivU", "") => IROp::DivU(bits),
        ("DivS", "") => IROp::DivS(bits),
        ("And", "") => IROp::And(bits),
        ("Or", "") => IROp::Or(bits),
        ("Xor", "") => IROp::Xor(bits),
        ("Shl", "") => IROp::Shl(bits),
        ("Shr", "") => IROp::Shr(bits),
        ("Sar", "") => IROp::Sar(bits),
        ("Not", "") => IROp::Not(bits),
        ("CmpEQ", "") => IROp::CmpEQ(bits),
        ("CmpNE", "") => IROp::CmpNE(bits),
        ("CmpLT", "S") => IROp::CmpLTS(bits),
        ("CmpLT", "U") => IROp::CmpLTU(bits),
        ("CmpLE", "S") => IROp::CmpLES(bits),
        ("CmpLE", "U") => IROp::CmpLEU(bits),
        ("CmpNEZ", "") => IROp::CmpNEZ(bits),
        ("Clz", "") => IROp::Clz(bits),
        ("Ctz", "") => IROp::Ctz(bits),
        ("Max", "U") => IROp::MaxU(bits),
        _ => return None,
    };
    Some(op)
}

impl IROp {
    pub fn parse(name: &str) -> IROp {
        let body = if name.starts_with("Iop_") { &name[4..] } else { name };
        parse_conversion(body)
            .or_else(|| parse_family(body))
            .unwrap_or_else(|| IROp::Other(name.to_string()))
    }
}

impl From<String> for IROp {
    fn from(name: String) -> IROp {
        IROp::parse(&name)
    }
}

impl From<IROp> for String {
    fn from(op: IROp) -> String {
        op.to_string()
    }
}

impl fmt::Display for IROp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IROp::Add(n) => write!(f, "Iop_Add{}", n),
            IROp::Sub(n) => write!(f, "Iop_Sub{}", n),
            IROp::Mul(n) => write!(f, "Iop_Mul{}", n),
            IROp::MullS(n) => write!(f, "Iop_MullS{}", n),
            IROp::MullU(n) => write!(f, "Iop_MullU{}", n),
            IROp::DivU(n) => write!(f, "Iop_DivU{}", n),
            IROp::DivS(n) => write!(f, "Iop_DivS{}", n),
            IROp::DivModU { from, to } => write!(f, "Iop_DivModU{}to{}", from, to),
            IROp::DivModS { from, to } => write!(f, "Iop_DivModS{}to{}", from, to),
            IROp::And(n) => write!(f, "Iop_And{}", n),
            IROp::Or(n) => write!(f, "Iop_Or{}", n),
            IROp::Xor(n) => write!(f, "Iop_Xor{}", n),
            IROp::Shl(n) => write!(f, "Iop_Shl{}", n),
            IROp::Shr(n) => write!(f, "Iop_Shr{}", n),
            IROp::Sar(n) => write!(f, "Iop_Sar{}", n),
            IROp::Not(n) => write!(f, "Iop_Not{}", n),
            IROp::CmpEQ(n) => write!(f, "Iop_CmpEQ{}", n),
            IROp::CmpNE(n) => write!(f, "Iop_CmpNE{}", n),
            IROp::CmpLTS(n) => write!(f, "Iop_CmpLT{}S", n),
            IROp::CmpLTU(n) => write!(f, "Iop_CmpLT{}U", n),
            IROp::CmpLES(n) => write!(f, "Iop_CmpLE{}S", n),
            IROp::CmpLEU(n) => write!(f, "Iop_CmpLE{}U", n),
            IROp::CmpNEZ(n) => write!(f, "Iop_CmpNEZ{}", n),
            IROp::Clz(n) => write!(f, "Iop_Clz{}", n),
            IROp::Ctz(n) => write!(f, "Iop_Ctz{}", n),
            IROp::MaxU(n) => write!(f, "Iop_Max{}U", n),
            IROp::Uto { from, to } => write!(f, "Iop_{}Uto{}", from, to),
            IROp::Sto { from, to } => write!(f, "Iop_{}Sto{}", from, to),
            IROp::To { from, to } => write!(f, "Iop_{}to{}", from, to),
            IROp::HIto { from, to } => write!(f, "Iop_{}HIto{}", from, to),
            IROp::HLto { from, to } => write!(f, "Iop_{}HLto{}", from, to),
            IROp::Other(name) => f.write_str(name),
        }
    }
}

#[test]
fn parses_vex_names() {
    assert_eq!(IROp::parse("Iop_Add32"), IROp::Add(32));
    assert_eq!(IROp::parse("Iop_CmpLT64U"), IROp::CmpLTU(64));
    assert_eq!(IROp::parse("Iop_CmpLE8S"), IROp::CmpLES(8));
    assert_eq!(IROp::parse("Iop_8Uto32"), IROp::Uto { from: 8, to: 32 });
    assert_eq!(IROp::parse("Iop_1Sto64"), IROp::Sto { from: 1, to: 64 });
    assert_eq!(IROp::parse("Iop_64to1"), IROp::To { from: 64, to: 1 });
    assert_eq!(IROp::parse("Iop_64HIto32"), IROp::HIto { from: 64, to: 32 });
    assert_eq!(IROp::parse("Iop_32HLto64"), IROp::HLto { from: 32, to: 64 });
    assert_eq!(IROp::parse("Iop_DivModU64to32"), IROp::DivModU { from: 64, to: 32 });
    assert_eq!(IROp::parse("Iop_Max32U"), IROp::MaxU(32));
    assert_eq!(IROp::parse("Iop_AddF64"), IROp::Other("Iop_AddF64".to_string()));
    assert_eq!(IROp::parse("Iop_Add7"), IROp::Other("Iop_Add7".to_string()));
}

#[test]
fn display_round_trips_names() {
    for name in &["Iop_Sub16", "Iop_CmpLT32S", "Iop_16Sto64", "Iop_128HIto64", "Iop_DivModS128to64", "Iop_Sqrt64Fx2"] {
        assert_eq!(IROp::parse(name).to_string(), *name);
    }
}
