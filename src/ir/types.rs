use std::fmt;

/// declared type of an IR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IRType {
    #[serde(rename = "Ity_I1")]
    I1,
    #[serde(rename = "Ity_I8")]
    I8,
    #[serde(rename = "Ity_I16")]
    I16,
    #[serde(rename = "Ity_I32")]
    I32,
    #[serde(rename = "Ity_I64")]
    I64,
    #[serde(rename = "Ity_I128")]
    I128,
    #[serde(rename = "Ity_F32")]
    F32,
    #[serde(rename = "Ity_F64")]
    F64,
    #[serde(rename = "Ity_V128")]
    V128,
}

impl IRType {
    pub fn bits(&self) -> u32 {
        match self {
            IRType::I1 => 1,
            IRType::I8 => 8,
            IRType::I16 => 16,
            IRType::I32 | IRType::F32 => 32,
            IRType::I64 | IRType::F64 => 64,
            IRType::I128 | IRType::V128 => 128,
        }
    }
}

impl fmt::Display for IRType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            IRType::I1 => "Ity_I1",
            IRType::I8 => "Ity_I8",
            IRType::I16 => "Ity_I16",
            IRType::I32 => "Ity_I32",
            IRType::I64 => "Ity_I64",
            IRType::I128 => "Ity_I128",
            IRType::F32 => "Ity_F32",
            IRType::F64 => "Ity_F64",
            IRType::V128 => "Ity_V128",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endness {
    #[serde(rename = "Iend_LE")]
    LE,
    #[serde(rename = "Iend_BE")]
    BE,
}

/// literal carried by an `Iex_Const`. float constants are carried as their raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IRConst {
    #[serde(rename = "Ico_U1")]
    U1(bool),
    #[serde(rename = "Ico_U8")]
    U8(u8),
    #[serde(rename = "Ico_U16")]
    U16(u16),
    #[serde(rename = "Ico_U32")]
    U32(u32),
    #[serde(rename = "Ico_U64")]
    U64(u64),
    #[serde(rename = "Ico_F32")]
    F32(u32),
    #[serde(rename = "Ico_F64")]
    F64(u64),
    /// one bit per byte lane: a set bit is an `0xff` byte, a clear bit is `0x00`.
    #[serde(rename = "Ico_V128")]
    V128(u16),
}

impl IRConst {
    pub fn ty(&self) -> IRType {
        match self {
            IRConst::U1(_) => IRType::I1,
            IRConst::U8(_) => IRType::I8,
            IRConst::U16(_) => IRType::I16,
            IRConst::U32(_) => IRType::I32,
            IRConst::U64(_) => IRType::I64,
            IRConst::F32(_) => IRType::F32,
            IRConst::F64(_) => IRType::F64,
            IRConst::V128(_) => IRType::V128,
        }
    }
}
