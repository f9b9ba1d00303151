//! The registered entity catalog.
//!
//! The full BroadWorks command catalog runs to thousands of entities and is
//! pure schema data; the modules here carry the subset this crate ships,
//! declared with [`entity!`](crate::entity!). A generated catalog would extend
//! these modules with further invocations of the same macro.

mod auth;
mod base;
mod device;
mod group;
mod user;

pub use auth::{
    AuthenticationRequest, AuthenticationResponse, LoginRequest14sp4, LoginRequest22V5,
    LoginResponse14sp4, LoginResponse22V5,
};
pub use base::{ErrorResponse, SuccessResponse};
pub use device::AccessDevice;
pub use group::{GroupCallCenterGetInstanceResponse22, ServiceInstanceReadProfile19sp1};
pub use user::{
    ConsolidatedServicePackAssignment, ReplacementConsolidatedServicePackAssignmentList,
    UserConsolidatedModifyRequest22, UserGetRegistrationListRequest,
    UserGetRegistrationListResponse,
};

use crate::descriptor::Descriptor;
use crate::entity::OciEntity;

/// Every descriptor this crate ships, in registration order.
pub fn descriptors() -> Vec<&'static Descriptor> {
    vec![
        AuthenticationRequest::descriptor(),
        AuthenticationResponse::descriptor(),
        LoginRequest22V5::descriptor(),
        LoginResponse22V5::descriptor(),
        LoginRequest14sp4::descriptor(),
        LoginResponse14sp4::descriptor(),
        ErrorResponse::descriptor(),
        SuccessResponse::descriptor(),
        AccessDevice::descriptor(),
        ServiceInstanceReadProfile19sp1::descriptor(),
        GroupCallCenterGetInstanceResponse22::descriptor(),
        UserGetRegistrationListRequest::descriptor(),
        UserGetRegistrationListResponse::descriptor(),
        UserConsolidatedModifyRequest22::descriptor(),
        ReplacementConsolidatedServicePackAssignmentList::descriptor(),
        ConsolidatedServicePackAssignment::descriptor(),
    ]
}
