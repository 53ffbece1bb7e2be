mod api;
mod data_type;
mod document;
mod forward;

pub use api::{ApiEntry, ApiReturn, HttpMethod, ParamGroups, ParamSource, ReturnData, ReturnType};
pub use data_type::{DataType, MemberAttr, TypeExpr, BUILTIN_TYPES};
pub use document::{url_join, ApiDocument};
pub use forward::{
    ApiForward, ForwardTarget, GrpcTarget, HttpTarget, OnFail, RedisTarget, TargetKind,
};
