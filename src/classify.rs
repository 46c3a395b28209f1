//! Maps wire error responses onto [`ErrorCode`] variants.
//!
//! Lookup goes through the table of the service that answered first, then the
//! common table, and finally falls back to [`ErrorCode::Unrecognized`] so that
//! no error is ever dropped.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::context::header_str;
use crate::error::{AzureError, ErrorCode};
use crate::request::ServiceType;
use crate::xml::{parse_error_body, ErrorBody};

pub(crate) const COMMON_ERRORS: &[ErrorCode] = &[
    ErrorCode::AccountAlreadyExists,
    ErrorCode::AccountBeingCreated,
    ErrorCode::AccountIsDisabled,
    ErrorCode::AuthenticationFailed,
    ErrorCode::AuthorizationFailure,
    ErrorCode::AuthorizationPermissionMismatch,
    ErrorCode::AuthorizationProtocolMismatch,
    ErrorCode::AuthorizationResourceTypeMismatch,
    ErrorCode::AuthorizationServiceMismatch,
    ErrorCode::AuthorizationSourceIPMismatch,
    ErrorCode::ConditionHeadersNotSupported,
    ErrorCode::ConditionNotMetForRead,
    ErrorCode::ConditionNotMetForWrite,
    ErrorCode::EmptyMetadataKey,
    ErrorCode::InsufficientAccountPermissionsForRead,
    ErrorCode::InsufficientAccountPermissionsForWrite,
    ErrorCode::InsufficientAccountPermissionsForExecute,
    ErrorCode::InternalError,
    ErrorCode::InvalidAuthenticationInfo,
    ErrorCode::InvalidHeaderValue,
    ErrorCode::InvalidHttpVerb,
    ErrorCode::InvalidInput,
    ErrorCode::InvalidMd5,
    ErrorCode::InvalidMetadata,
    ErrorCode::InvalidQueryParameterValue,
    ErrorCode::InvalidRange,
    ErrorCode::InvalidResourceName,
    ErrorCode::InvalidUri,
    ErrorCode::InvalidXmlDocument,
    ErrorCode::InvalidXmlNodeValue,
    ErrorCode::Md5Mismatch,
    ErrorCode::MetadataTooLarge,
    ErrorCode::MissingContentLengthHeader,
    ErrorCode::MissingRequiredQueryParameter,
    ErrorCode::MissingRequiredHeader,
    ErrorCode::MissingRequiredXmlNode,
    ErrorCode::MultipleConditionHeadersNotSupported,
    ErrorCode::OperationTimedOut,
    ErrorCode::OutOfRangeInput,
    ErrorCode::OutOfRangeQueryParameterValue,
    ErrorCode::RequestBodyTooLarge,
    ErrorCode::ResourceTypeMismatch,
    ErrorCode::RequestUrlFailedToParse,
    ErrorCode::ResourceAlreadyExists,
    ErrorCode::ResourceNotFound,
    ErrorCode::ServerBusy,
    ErrorCode::ServerBusyIngress,
    ErrorCode::ServerBusyEgress,
    ErrorCode::ServerBusyOperations,
    ErrorCode::UnsupportedHeader,
    ErrorCode::UnsupportedXmlNode,
    ErrorCode::UnsupportedQueryParameter,
    ErrorCode::UnsupportedHttpVerb,
];

pub(crate) const BLOB_ERRORS: &[ErrorCode] = &[
    ErrorCode::AppendPositionConditionNotMet,
    ErrorCode::BlobAlreadyExists,
    ErrorCode::BlobArchived,
    ErrorCode::BlobBeingRehydrated,
    ErrorCode::BlobImmutableDueToPolicy,
    ErrorCode::BlobNotArchived,
    ErrorCode::BlobNotFound,
    ErrorCode::BlobOverwritten,
    ErrorCode::BlobTierInadequateForContentLength,
    ErrorCode::BlobUsesCustomerSpecifiedEncryption,
    ErrorCode::BlockCountExceedsLimit,
    ErrorCode::BlockListTooLong,
    ErrorCode::CannotChangeToLowerTier,
    ErrorCode::CannotVerifyCopySource,
    ErrorCode::ContainerAlreadyExists,
    ErrorCode::ContainerBeingDeleted,
    ErrorCode::ContainerDisabled,
    ErrorCode::ContainerNotFound,
    ErrorCode::ContentLengthLargerThanTierLimit,
    ErrorCode::CopyAcrossAccountsNotSupported,
    ErrorCode::CopyIdMismatch,
    ErrorCode::FeatureVersionMismatch,
    ErrorCode::IncrementalCopyBlobMismatch,
    ErrorCode::IncrementalCopyOfEarlierVersionSnapshotNotAllowed,
    ErrorCode::IncrementalCopySourceMustBeSnapshot,
    ErrorCode::InfiniteLeaseDurationRequired,
    ErrorCode::InvalidBlobOrBlock,
    ErrorCode::InvalidBlobTier,
    ErrorCode::InvalidBlobType,
    ErrorCode::InvalidBlockId,
    ErrorCode::InvalidBlockList,
    ErrorCode::InvalidOperation,
    ErrorCode::InvalidPageRange,
    ErrorCode::InvalidSourceBlobType,
    ErrorCode::InvalidSourceBlobUrl,
    ErrorCode::InvalidVersionForPageBlobOperation,
    ErrorCode::LeaseAlreadyBroken,
    ErrorCode::LeaseAlreadyPresent,
    ErrorCode::LeaseIdMismatch,
    ErrorCode::LeaseIdMismatchWithBlobOperation,
    ErrorCode::LeaseIdMismatchWithContainerOperation,
    ErrorCode::LeaseIdMismatchWithLeaseOperation,
    ErrorCode::LeaseIdMissing,
    ErrorCode::LeaseIsBreakingAndCannotBeAcquired,
    ErrorCode::LeaseIsBreakingAndCannotBeChanged,
    ErrorCode::LeaseIsBrokenAndCannotBeRenewed,
    ErrorCode::LeaseLost,
    ErrorCode::LeaseNotPresentWithBlobOperation,
    ErrorCode::LeaseNotPresentWithContainerOperation,
    ErrorCode::LeaseNotPresentWithLeaseOperation,
    ErrorCode::MaxBlobSizeConditionNotMet,
    ErrorCode::NoPendingCopyOperation,
    ErrorCode::OperationNotAllowedOnIncrementalCopyBlob,
    ErrorCode::PendingCopyOperation,
    ErrorCode::PreviousSnapshotCannotBeNewer,
    ErrorCode::PreviousSnapshotNotFound,
    ErrorCode::PreviousSnapshotOperationNotSupported,
    ErrorCode::SequenceNumberConditionNotMet,
    ErrorCode::SequenceNumberIncrementTooLarge,
    ErrorCode::SnapshotCountExceeded,
    ErrorCode::SnapshotOperationRateExceeded,
    ErrorCode::SnapshotsPresent,
    ErrorCode::SourceConditionNotMet,
    ErrorCode::SystemInUse,
    ErrorCode::TargetConditionNotMet,
    ErrorCode::UnauthorizedBlobOverwrite,
    ErrorCode::UnsupportedBlobType,
];

pub(crate) const QUEUE_ERRORS: &[ErrorCode] = &[
    ErrorCode::InvalidMarker,
    ErrorCode::MessageNotFound,
    ErrorCode::MessageTooLarge,
    ErrorCode::PopReceiptMismatch,
    ErrorCode::QueueAlreadyExists,
    ErrorCode::QueueBeingDeleted,
    ErrorCode::QueueDisabled,
    ErrorCode::QueueNotEmpty,
    ErrorCode::QueueNotFound,
];

pub(crate) const TABLE_ERRORS: &[ErrorCode] = &[
    ErrorCode::AtomFormatNotSupported,
    ErrorCode::DuplicatePropertiesSpecified,
    ErrorCode::EntityAlreadyExists,
    ErrorCode::EntityNotFound,
    ErrorCode::EntityTooLarge,
    ErrorCode::HostInformationNotPresent,
    ErrorCode::InvalidDuplicateRow,
    ErrorCode::InvalidValueType,
    ErrorCode::JsonFormatNotSupported,
    ErrorCode::MethodNotAllowed,
    ErrorCode::NotImplemented,
    ErrorCode::PropertiesNeedValue,
    ErrorCode::PropertyNameInvalid,
    ErrorCode::PropertyNameTooLong,
    ErrorCode::PropertyValueTooLarge,
    ErrorCode::TableAlreadyExists,
    ErrorCode::TableBeingDeleted,
    ErrorCode::TableNotFound,
    ErrorCode::TooManyProperties,
    ErrorCode::UpdateConditionNotSatisfied,
    ErrorCode::XMethodIncorrectCount,
    ErrorCode::XMethodIncorrectValue,
    ErrorCode::XMethodNotUsingPost,
];

/// Returns the service-specific classification table.
fn service_table(service: ServiceType) -> &'static [ErrorCode] {
    match service {
        ServiceType::Blob => BLOB_ERRORS,
        ServiceType::Queue => QUEUE_ERRORS,
        ServiceType::Table => TABLE_ERRORS,
    }
}

fn lookup(table: &[ErrorCode], code: &str) -> Option<ErrorCode> {
    table.iter().copied().find(|kind| kind.as_str() == code)
}

/// Classifies a wire error code returned by `service`.
///
/// Codes the service reuses for different conditions are told apart using
/// the HTTP status or the message text.
pub fn classify(service: ServiceType, status: StatusCode, code: &str, message: &str) -> ErrorCode {
    match code {
        "ConditionNotMet" => {
            if status == StatusCode::NOT_MODIFIED {
                ErrorCode::ConditionNotMetForRead
            } else {
                ErrorCode::ConditionNotMetForWrite
            }
        }
        "InsufficientAccountPermissions" => {
            let message = message.to_lowercase();
            if message.contains("read operation") {
                ErrorCode::InsufficientAccountPermissionsForRead
            } else if message.contains("write operation") {
                ErrorCode::InsufficientAccountPermissionsForWrite
            } else {
                ErrorCode::InsufficientAccountPermissionsForExecute
            }
        }
        "ServerBusy" => {
            let message = message.to_lowercase();
            if message.starts_with("ingress") {
                ErrorCode::ServerBusyIngress
            } else if message.starts_with("egress") {
                ErrorCode::ServerBusyEgress
            } else if message.starts_with("operations per second") {
                ErrorCode::ServerBusyOperations
            } else {
                ErrorCode::ServerBusy
            }
        }
        _ => lookup(service_table(service), code)
            .or_else(|| lookup(COMMON_ERRORS, code))
            .unwrap_or(ErrorCode::Unrecognized),
    }
}

/// Table service JSON error body:
/// `{"odata.error":{"code":"...","message":{"lang":"en-US","value":"..."}}}`.
#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    #[serde(rename = "odata.error")]
    error: ODataError,
}

#[derive(Debug, Deserialize)]
struct ODataError {
    code: String,
    #[serde(default)]
    message: Option<ODataMessage>,
}

#[derive(Debug, Deserialize)]
struct ODataMessage {
    #[serde(default)]
    value: String,
}

/// Extracts code, message and extra details from an error response body.
///
/// XML bodies are the norm, the Table service answers in JSON when asked for
/// JSON, and HEAD responses have no body at all, in which case the
/// `x-ms-error-code` header carries the code.
fn parse_error_response(headers: &HeaderMap, body: &[u8]) -> ErrorBody {
    let text = String::from_utf8_lossy(body);
    let text = text.trim_start_matches('\u{feff}').trim();

    let mut parsed = if text.starts_with('{') {
        serde_json::from_str::<ODataErrorBody>(text)
            .map(|b| ErrorBody {
                code: b.error.code,
                message: b.error.message.map(|m| m.value).unwrap_or_default(),
                details: BTreeMap::new(),
            })
            .unwrap_or_default()
    } else if text.starts_with('<') {
        parse_error_body(text).unwrap_or_default()
    } else {
        ErrorBody::default()
    };

    if parsed.code.is_empty() {
        if let Some(code) = header_str(headers, "x-ms-error-code") {
            parsed.code = code.to_string();
        }
    }
    if parsed.message.is_empty() && !text.is_empty() && !text.starts_with('<') && !text.starts_with('{') {
        parsed.message = text.to_string();
    }

    parsed
}

/// Builds a classified [`AzureError`] from a non-success response.
pub fn classify_response(
    service: ServiceType,
    status: StatusCode,
    headers: &HeaderMap,
    body: &Bytes,
) -> AzureError {
    let ErrorBody {
        code,
        message,
        details,
    } = parse_error_response(headers, body);

    let kind = classify(service, status, &code, &message);

    AzureError {
        kind,
        service,
        status,
        code,
        message,
        request_id: header_str(headers, "x-ms-request-id").map(String::from),
        details,
    }
}
