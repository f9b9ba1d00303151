//! Responses every command can produce.

crate::entity! {
    /// Failure reply. `summary` and `detail` describe the fault; `errorCode`
    /// is the numeric server code.
    pub struct ErrorResponse: ErrorResponse, "ErrorResponse" {
        summary, "summary": scalar(String), optional;
        summary_english, "summaryEnglish": scalar(String), optional;
        detail, "detail": scalar(String), optional;
        error_code, "errorCode": scalar(Int), optional;
    }
}

crate::entity! {
    /// Empty acknowledgement.
    pub struct SuccessResponse: SuccessResponse, "SuccessResponse" {
    }
}
