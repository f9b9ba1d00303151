//! User provisioning commands.

crate::entity! {
    /// Ask for the SIP registrations of a user.
    pub struct UserGetRegistrationListRequest: Request, "UserGetRegistrationListRequest" {
        user_id, "userId": scalar(String), required;
    }
}

crate::entity! {
    /// Registration rows keyed by the table headings, typically
    /// `deviceName`, `endpointType`, and `line/port`.
    pub struct UserGetRegistrationListResponse: DataResponse, "UserGetRegistrationListResponse" {
        registration_table, "registrationTable": table, optional;
    }
}

crate::entity! {
    /// One service pack grant inside a consolidated modify.
    pub struct ConsolidatedServicePackAssignment: Type, "ConsolidatedServicePackAssignment" {
        service_pack_name, "servicePackName": scalar(String), required;
        authorized_quantity, "authorizedQuantity": scalar(Int), optional;
    }
}

crate::entity! {
    /// Replaces the full service pack assignment list of a user.
    pub struct ReplacementConsolidatedServicePackAssignmentList: Type,
        "ReplacementConsolidatedServicePackAssignmentList" {
        service_pack, "servicePack": repeated(composite(ConsolidatedServicePackAssignment)), optional;
    }
}

crate::entity! {
    /// Consolidated user modify; only the service pack list portion is
    /// carried here.
    pub struct UserConsolidatedModifyRequest22: Request, "UserConsolidatedModifyRequest22" {
        user_id, "userId": scalar(String), required;
        service_pack_list, "servicePackList":
            composite(ReplacementConsolidatedServicePackAssignmentList), optional;
    }
}
