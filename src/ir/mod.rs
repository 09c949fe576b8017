//! the lifted IR handed to us by the lifter. these are expression trees in the shape of VEX's
//! `IRExpr`; they are never mutated once produced.
//!
//! trees can be built directly or deserialized from JSON, where each node carries its kind in a
//! `"tag"` field using VEX spellings (`"Iex_Get"`, `"Iex_Binop"`, ...).

pub mod ops;
pub mod types;

pub use self::ops::IROp;
pub use self::types::{Endness, IRConst, IRType};

use error::{Error, Result};

/// a guest register array, the `descr` of an indexed register read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IRRegArray {
    pub base: u64,
    pub elem_ty: IRType,
    pub n_elems: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum IRExpr {
    /// a pattern-matching placeholder. only meaningful inside VEX's own optimizer.
    #[serde(rename = "Iex_Binder")]
    Binder { binder: u32 },
    #[serde(rename = "Iex_Get")]
    Get { offset: u64, ty: IRType },
    #[serde(rename = "Iex_GetI")]
    GetI { descr: IRRegArray, ix: Box<IRExpr>, bias: i32 },
    #[serde(rename = "Iex_Unop")]
    Unop { op: IROp, arg: Box<IRExpr> },
    #[serde(rename = "Iex_Binop")]
    Binop { op: IROp, arg1: Box<IRExpr>, arg2: Box<IRExpr> },
    #[serde(rename = "Iex_Triop")]
    Triop { op: IROp, arg1: Box<IRExpr>, arg2: Box<IRExpr>, arg3: Box<IRExpr> },
    #[serde(rename = "Iex_Qop")]
    Qop { op: IROp, arg1: Box<IRExpr>, arg2: Box<IRExpr>, arg3: Box<IRExpr>, arg4: Box<IRExpr> },
    #[serde(rename = "Iex_RdTmp")]
    RdTmp { tmp: u32 },
    #[serde(rename = "Iex_Const")]
    Const { con: IRConst },
    #[serde(rename = "Iex_Load")]
    Load { end: Endness, ty: IRType, addr: Box<IRExpr> },
    #[serde(rename = "Iex_CCall")]
    CCall { callee: String, retty: IRType, args: Vec<IRExpr> },
    #[serde(rename = "Iex_Mux0X")]
    Mux0X {
        cond: Box<IRExpr>,
        expr0: Box<IRExpr>,
        #[serde(rename = "exprX")]
        expr_x: Box<IRExpr>,
    },
}

impl IRExpr {
    pub fn from_json(text: &str) -> Result<IRExpr> {
        serde_json::from_str(text).map_err(Error::MalformedIr)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            IRExpr::Binder { .. } => "Iex_Binder",
            IRExpr::Get { .. } => "Iex_Get",
            IRExpr::GetI { .. } => "Iex_GetI",
            IRExpr::Unop { .. } => "Iex_Unop",
            IRExpr::Binop { .. } => "Iex_Binop",
            IRExpr::Triop { .. } => "Iex_Triop",
            IRExpr::Qop { .. } => "Iex_Qop",
            IRExpr::RdTmp { .. } => "Iex_RdTmp",
            IRExpr::Const { .. } => "Iex_Const",
            IRExpr::Load { .. } => "Iex_Load",
            IRExpr::CCall { .. } => "Iex_CCall",
            IRExpr::Mux0X { .. } => "Iex_Mux0X",
        }
    }

    /// operator and operands, left to right, for the four operator-application kinds.
    pub fn op_args(&self) -> Option<(&IROp, Vec<&IRExpr>)> {
        match self {
            IRExpr::Unop { op, arg } => Some((op, vec![&**arg])),
            IRExpr::Binop { op, arg1, arg2 } => Some((op, vec![&**arg1, &**arg2])),
            IRExpr::Triop { op, arg1, arg2, arg3 } => Some((op, vec![&**arg1, &**arg2, &**arg3])),
            IRExpr::Qop { op, arg1, arg2, arg3, arg4 } => {
                Some((op, vec![&**arg1, &**arg2, &**arg3, &**arg4]))
            }
            _ => None,
        }
    }

    pub fn get(offset: u64, ty: IRType) -> IRExpr {
        IRExpr::Get { offset, ty }
    }

    pub fn rdtmp(tmp: u32) -> IRExpr {
        IRExpr::RdTmp { tmp }
    }

    pub fn constant(con: IRConst) -> IRExpr {
        IRExpr::Const { con }
    }

    pub fn unop(op: IROp, arg: IRExpr) -> IRExpr {
        IRExpr::Unop { op, arg: Box::new(arg) }
    }

    pub fn binop(op: IROp, arg1: IRExpr, arg2: IRExpr) -> IRExpr {
        IRExpr::Binop { op, arg1: Box::new(arg1), arg2: Box::new(arg2) }
    }

    pub fn load(end: Endness, ty: IRType, addr: IRExpr) -> IRExpr {
        IRExpr::Load { end, ty, addr: Box::new(addr) }
    }

    pub fn ccall<T: Into<String>>(callee: T, retty: IRType, args: Vec<IRExpr>) -> IRExpr {
        IRExpr::CCall { callee: callee.into(), retty, args }
    }

    pub fn mux0x(cond: IRExpr, expr0: IRExpr, expr_x: IRExpr) -> IRExpr {
        IRExpr::Mux0X { cond: Box::new(cond), expr0: Box::new(expr0), expr_x: Box::new(expr_x) }
    }
}
