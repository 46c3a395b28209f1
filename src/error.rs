//! Azure Storage error types and client-side failure taxonomy.

use http::StatusCode;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::request::ServiceType;

/// Azure Storage error codes.
///
/// One variant per wire error code. Codes the service reuses under different
/// conditions are split into distinct variants (`ConditionNotMetForRead` and
/// `ConditionNotMetForWrite` both arrive as `ConditionNotMet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // General errors
    AccountAlreadyExists,
    AccountBeingCreated,
    AccountIsDisabled,
    AuthenticationFailed,
    AuthorizationFailure,
    AuthorizationPermissionMismatch,
    AuthorizationProtocolMismatch,
    AuthorizationResourceTypeMismatch,
    AuthorizationServiceMismatch,
    AuthorizationSourceIPMismatch,
    ConditionHeadersNotSupported,
    ConditionNotMetForRead,
    ConditionNotMetForWrite,
    EmptyMetadataKey,
    InsufficientAccountPermissionsForRead,
    InsufficientAccountPermissionsForWrite,
    InsufficientAccountPermissionsForExecute,
    InternalError,
    InvalidAuthenticationInfo,
    InvalidHeaderValue,
    InvalidHttpVerb,
    InvalidInput,
    InvalidMd5,
    InvalidMetadata,
    InvalidQueryParameterValue,
    InvalidRange,
    InvalidResourceName,
    InvalidUri,
    InvalidXmlDocument,
    InvalidXmlNodeValue,
    Md5Mismatch,
    MetadataTooLarge,
    MissingContentLengthHeader,
    MissingRequiredQueryParameter,
    MissingRequiredHeader,
    MissingRequiredXmlNode,
    MultipleConditionHeadersNotSupported,
    OperationTimedOut,
    OutOfRangeInput,
    OutOfRangeQueryParameterValue,
    RequestBodyTooLarge,
    ResourceTypeMismatch,
    RequestUrlFailedToParse,
    ResourceAlreadyExists,
    ResourceNotFound,
    ServerBusy,
    ServerBusyIngress,
    ServerBusyEgress,
    ServerBusyOperations,
    UnsupportedHeader,
    UnsupportedXmlNode,
    UnsupportedQueryParameter,
    UnsupportedHttpVerb,

    // Blob-specific errors
    AppendPositionConditionNotMet,
    BlobAlreadyExists,
    BlobArchived,
    BlobBeingRehydrated,
    BlobImmutableDueToPolicy,
    BlobNotArchived,
    BlobNotFound,
    BlobOverwritten,
    BlobTierInadequateForContentLength,
    BlobUsesCustomerSpecifiedEncryption,
    BlockCountExceedsLimit,
    BlockListTooLong,
    CannotChangeToLowerTier,
    CannotVerifyCopySource,
    ContainerAlreadyExists,
    ContainerBeingDeleted,
    ContainerDisabled,
    ContainerNotFound,
    ContentLengthLargerThanTierLimit,
    CopyAcrossAccountsNotSupported,
    CopyIdMismatch,
    FeatureVersionMismatch,
    IncrementalCopyBlobMismatch,
    IncrementalCopyOfEarlierVersionSnapshotNotAllowed,
    IncrementalCopySourceMustBeSnapshot,
    InfiniteLeaseDurationRequired,
    InvalidBlobOrBlock,
    InvalidBlobTier,
    InvalidBlobType,
    InvalidBlockId,
    InvalidBlockList,
    InvalidOperation,
    InvalidPageRange,
    InvalidSourceBlobType,
    InvalidSourceBlobUrl,
    InvalidVersionForPageBlobOperation,
    LeaseAlreadyBroken,
    LeaseAlreadyPresent,
    LeaseIdMismatch,
    LeaseIdMismatchWithBlobOperation,
    LeaseIdMismatchWithContainerOperation,
    LeaseIdMismatchWithLeaseOperation,
    LeaseIdMissing,
    LeaseIsBreakingAndCannotBeAcquired,
    LeaseIsBreakingAndCannotBeChanged,
    LeaseIsBrokenAndCannotBeRenewed,
    LeaseLost,
    LeaseNotPresentWithBlobOperation,
    LeaseNotPresentWithContainerOperation,
    LeaseNotPresentWithLeaseOperation,
    MaxBlobSizeConditionNotMet,
    NoPendingCopyOperation,
    OperationNotAllowedOnIncrementalCopyBlob,
    PendingCopyOperation,
    PreviousSnapshotCannotBeNewer,
    PreviousSnapshotNotFound,
    PreviousSnapshotOperationNotSupported,
    SequenceNumberConditionNotMet,
    SequenceNumberIncrementTooLarge,
    SnapshotCountExceeded,
    SnapshotOperationRateExceeded,
    SnapshotsPresent,
    SourceConditionNotMet,
    SystemInUse,
    TargetConditionNotMet,
    UnauthorizedBlobOverwrite,
    UnsupportedBlobType,

    // Queue-specific errors
    InvalidMarker,
    MessageNotFound,
    MessageTooLarge,
    PopReceiptMismatch,
    QueueAlreadyExists,
    QueueBeingDeleted,
    QueueDisabled,
    QueueNotEmpty,
    QueueNotFound,

    // Table-specific errors
    AtomFormatNotSupported,
    DuplicatePropertiesSpecified,
    EntityAlreadyExists,
    EntityNotFound,
    EntityTooLarge,
    HostInformationNotPresent,
    InvalidDuplicateRow,
    InvalidValueType,
    JsonFormatNotSupported,
    MethodNotAllowed,
    NotImplemented,
    PropertiesNeedValue,
    PropertyNameInvalid,
    PropertyNameTooLong,
    PropertyValueTooLarge,
    TableAlreadyExists,
    TableBeingDeleted,
    TableNotFound,
    TooManyProperties,
    UpdateConditionNotSatisfied,
    XMethodIncorrectCount,
    XMethodIncorrectValue,
    XMethodNotUsingPost,

    /// A code that none of the classification tables know about.
    Unrecognized,
}

impl ErrorCode {
    /// Returns the wire representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AccountAlreadyExists => "AccountAlreadyExists",
            ErrorCode::AccountBeingCreated => "AccountBeingCreated",
            ErrorCode::AccountIsDisabled => "AccountIsDisabled",
            ErrorCode::AuthenticationFailed => "AuthenticationFailed",
            ErrorCode::AuthorizationFailure => "AuthorizationFailure",
            ErrorCode::AuthorizationPermissionMismatch => "AuthorizationPermissionMismatch",
            ErrorCode::AuthorizationProtocolMismatch => "AuthorizationProtocolMismatch",
            ErrorCode::AuthorizationResourceTypeMismatch => "AuthorizationResourceTypeMismatch",
            ErrorCode::AuthorizationServiceMismatch => "AuthorizationServiceMismatch",
            ErrorCode::AuthorizationSourceIPMismatch => "AuthorizationSourceIPMismatch",
            ErrorCode::ConditionHeadersNotSupported => "ConditionHeadersNotSupported",
            ErrorCode::ConditionNotMetForRead => "ConditionNotMet",
            ErrorCode::ConditionNotMetForWrite => "ConditionNotMet",
            ErrorCode::EmptyMetadataKey => "EmptyMetadataKey",
            ErrorCode::InsufficientAccountPermissionsForRead => "InsufficientAccountPermissions",
            ErrorCode::InsufficientAccountPermissionsForWrite => "InsufficientAccountPermissions",
            ErrorCode::InsufficientAccountPermissionsForExecute => "InsufficientAccountPermissions",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::InvalidAuthenticationInfo => "InvalidAuthenticationInfo",
            ErrorCode::InvalidHeaderValue => "InvalidHeaderValue",
            ErrorCode::InvalidHttpVerb => "InvalidHttpVerb",
            ErrorCode::InvalidInput => "InvalidInput",
            ErrorCode::InvalidMd5 => "InvalidMd5",
            ErrorCode::InvalidMetadata => "InvalidMetadata",
            ErrorCode::InvalidQueryParameterValue => "InvalidQueryParameterValue",
            ErrorCode::InvalidRange => "InvalidRange",
            ErrorCode::InvalidResourceName => "InvalidResourceName",
            ErrorCode::InvalidUri => "InvalidUri",
            ErrorCode::InvalidXmlDocument => "InvalidXmlDocument",
            ErrorCode::InvalidXmlNodeValue => "InvalidXmlNodeValue",
            ErrorCode::Md5Mismatch => "Md5Mismatch",
            ErrorCode::MetadataTooLarge => "MetadataTooLarge",
            ErrorCode::MissingContentLengthHeader => "MissingContentLengthHeader",
            ErrorCode::MissingRequiredQueryParameter => "MissingRequiredQueryParameter",
            ErrorCode::MissingRequiredHeader => "MissingRequiredHeader",
            ErrorCode::MissingRequiredXmlNode => "MissingRequiredXmlNode",
            ErrorCode::MultipleConditionHeadersNotSupported => {
                "MultipleConditionHeadersNotSupported"
            }
            ErrorCode::OperationTimedOut => "OperationTimedOut",
            ErrorCode::OutOfRangeInput => "OutOfRangeInput",
            ErrorCode::OutOfRangeQueryParameterValue => "OutOfRangeQueryParameterValue",
            ErrorCode::RequestBodyTooLarge => "RequestBodyTooLarge",
            ErrorCode::ResourceTypeMismatch => "ResourceTypeMismatch",
            ErrorCode::RequestUrlFailedToParse => "RequestUrlFailedToParse",
            ErrorCode::ResourceAlreadyExists => "ResourceAlreadyExists",
            ErrorCode::ResourceNotFound => "ResourceNotFound",
            ErrorCode::ServerBusy => "ServerBusy",
            ErrorCode::ServerBusyIngress => "ServerBusy",
            ErrorCode::ServerBusyEgress => "ServerBusy",
            ErrorCode::ServerBusyOperations => "ServerBusy",
            ErrorCode::UnsupportedHeader => "UnsupportedHeader",
            ErrorCode::UnsupportedXmlNode => "UnsupportedXmlNode",
            ErrorCode::UnsupportedQueryParameter => "UnsupportedQueryParameter",
            ErrorCode::UnsupportedHttpVerb => "UnsupportedHttpVerb",
            ErrorCode::AppendPositionConditionNotMet => "AppendPositionConditionNotMet",
            ErrorCode::BlobAlreadyExists => "BlobAlreadyExists",
            ErrorCode::BlobArchived => "BlobArchived",
            ErrorCode::BlobBeingRehydrated => "BlobBeingRehydrated",
            ErrorCode::BlobImmutableDueToPolicy => "BlobImmutableDueToPolicy",
            ErrorCode::BlobNotArchived => "BlobNotArchived",
            ErrorCode::BlobNotFound => "BlobNotFound",
            ErrorCode::BlobOverwritten => "BlobOverwritten",
            ErrorCode::BlobTierInadequateForContentLength => "BlobTierInadequateForContentLength",
            ErrorCode::BlobUsesCustomerSpecifiedEncryption => "BlobUsesCustomerSpecifiedEncryption",
            ErrorCode::BlockCountExceedsLimit => "BlockCountExceedsLimit",
            ErrorCode::BlockListTooLong => "BlockListTooLong",
            ErrorCode::CannotChangeToLowerTier => "CannotChangeToLowerTier",
            ErrorCode::CannotVerifyCopySource => "CannotVerifyCopySource",
            ErrorCode::ContainerAlreadyExists => "ContainerAlreadyExists",
            ErrorCode::ContainerBeingDeleted => "ContainerBeingDeleted",
            ErrorCode::ContainerDisabled => "ContainerDisabled",
            ErrorCode::ContainerNotFound => "ContainerNotFound",
            ErrorCode::ContentLengthLargerThanTierLimit => "ContentLengthLargerThanTierLimit",
            ErrorCode::CopyAcrossAccountsNotSupported => "CopyAcrossAccountsNotSupported",
            ErrorCode::CopyIdMismatch => "CopyIdMismatch",
            ErrorCode::FeatureVersionMismatch => "FeatureVersionMismatch",
            ErrorCode::IncrementalCopyBlobMismatch => "IncrementalCopyBlobMismatch",
            ErrorCode::IncrementalCopyOfEarlierVersionSnapshotNotAllowed => {
                "IncrementalCopyOfEarlierVersionSnapshotNotAllowed"
            }
            ErrorCode::IncrementalCopySourceMustBeSnapshot => "IncrementalCopySourceMustBeSnapshot",
            ErrorCode::InfiniteLeaseDurationRequired => "InfiniteLeaseDurationRequired",
            ErrorCode::InvalidBlobOrBlock => "InvalidBlobOrBlock",
            ErrorCode::InvalidBlobTier => "InvalidBlobTier",
            ErrorCode::InvalidBlobType => "InvalidBlobType",
            ErrorCode::InvalidBlockId => "InvalidBlockId",
            ErrorCode::InvalidBlockList => "InvalidBlockList",
            ErrorCode::InvalidOperation => "InvalidOperation",
            ErrorCode::InvalidPageRange => "InvalidPageRange",
            ErrorCode::InvalidSourceBlobType => "InvalidSourceBlobType",
            ErrorCode::InvalidSourceBlobUrl => "InvalidSourceBlobUrl",
            ErrorCode::InvalidVersionForPageBlobOperation => "InvalidVersionForPageBlobOperation",
            ErrorCode::LeaseAlreadyBroken => "LeaseAlreadyBroken",
            ErrorCode::LeaseAlreadyPresent => "LeaseAlreadyPresent",
            ErrorCode::LeaseIdMismatch => "LeaseIdMismatch",
            ErrorCode::LeaseIdMismatchWithBlobOperation => "LeaseIdMismatchWithBlobOperation",
            ErrorCode::LeaseIdMismatchWithContainerOperation => {
                "LeaseIdMismatchWithContainerOperation"
            }
            ErrorCode::LeaseIdMismatchWithLeaseOperation => "LeaseIdMismatchWithLeaseOperation",
            ErrorCode::LeaseIdMissing => "LeaseIdMissing",
            ErrorCode::LeaseIsBreakingAndCannotBeAcquired => "LeaseIsBreakingAndCannotBeAcquired",
            ErrorCode::LeaseIsBreakingAndCannotBeChanged => "LeaseIsBreakingAndCannotBeChanged",
            ErrorCode::LeaseIsBrokenAndCannotBeRenewed => "LeaseIsBrokenAndCannotBeRenewed",
            ErrorCode::LeaseLost => "LeaseLost",
            ErrorCode::LeaseNotPresentWithBlobOperation => "LeaseNotPresentWithBlobOperation",
            ErrorCode::LeaseNotPresentWithContainerOperation => {
                "LeaseNotPresentWithContainerOperation"
            }
            ErrorCode::LeaseNotPresentWithLeaseOperation => "LeaseNotPresentWithLeaseOperation",
            ErrorCode::MaxBlobSizeConditionNotMet => "MaxBlobSizeConditionNotMet",
            ErrorCode::NoPendingCopyOperation => "NoPendingCopyOperation",
            ErrorCode::OperationNotAllowedOnIncrementalCopyBlob => {
                "OperationNotAllowedOnIncrementalCopyBlob"
            }
            ErrorCode::PendingCopyOperation => "PendingCopyOperation",
            ErrorCode::PreviousSnapshotCannotBeNewer => "PreviousSnapshotCannotBeNewer",
            ErrorCode::PreviousSnapshotNotFound => "PreviousSnapshotNotFound",
            ErrorCode::PreviousSnapshotOperationNotSupported => {
                "PreviousSnapshotOperationNotSupported"
            }
            ErrorCode::SequenceNumberConditionNotMet => "SequenceNumberConditionNotMet",
            ErrorCode::SequenceNumberIncrementTooLarge => "SequenceNumberIncrementTooLarge",
            ErrorCode::SnapshotCountExceeded => "SnapshotCountExceeded",
            ErrorCode::SnapshotOperationRateExceeded => "SnapshotOperationRateExceeded",
            ErrorCode::SnapshotsPresent => "SnapshotsPresent",
            ErrorCode::SourceConditionNotMet => "SourceConditionNotMet",
            ErrorCode::SystemInUse => "SystemInUse",
            ErrorCode::TargetConditionNotMet => "TargetConditionNotMet",
            ErrorCode::UnauthorizedBlobOverwrite => "UnauthorizedBlobOverwrite",
            ErrorCode::UnsupportedBlobType => "UnsupportedBlobType",
            ErrorCode::InvalidMarker => "InvalidMarker",
            ErrorCode::MessageNotFound => "MessageNotFound",
            ErrorCode::MessageTooLarge => "MessageTooLarge",
            ErrorCode::PopReceiptMismatch => "PopReceiptMismatch",
            ErrorCode::QueueAlreadyExists => "QueueAlreadyExists",
            ErrorCode::QueueBeingDeleted => "QueueBeingDeleted",
            ErrorCode::QueueDisabled => "QueueDisabled",
            ErrorCode::QueueNotEmpty => "QueueNotEmpty",
            ErrorCode::QueueNotFound => "QueueNotFound",
            ErrorCode::AtomFormatNotSupported => "AtomFormatNotSupported",
            ErrorCode::DuplicatePropertiesSpecified => "DuplicatePropertiesSpecified",
            ErrorCode::EntityAlreadyExists => "EntityAlreadyExists",
            ErrorCode::EntityNotFound => "EntityNotFound",
            ErrorCode::EntityTooLarge => "EntityTooLarge",
            ErrorCode::HostInformationNotPresent => "HostInformationNotPresent",
            ErrorCode::InvalidDuplicateRow => "InvalidDuplicateRow",
            ErrorCode::InvalidValueType => "InvalidValueType",
            ErrorCode::JsonFormatNotSupported => "JsonFormatNotSupported",
            ErrorCode::MethodNotAllowed => "MethodNotAllowed",
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::PropertiesNeedValue => "PropertiesNeedValue",
            ErrorCode::PropertyNameInvalid => "PropertyNameInvalid",
            ErrorCode::PropertyNameTooLong => "PropertyNameTooLong",
            ErrorCode::PropertyValueTooLarge => "PropertyValueTooLarge",
            ErrorCode::TableAlreadyExists => "TableAlreadyExists",
            ErrorCode::TableBeingDeleted => "TableBeingDeleted",
            ErrorCode::TableNotFound => "TableNotFound",
            ErrorCode::TooManyProperties => "TooManyProperties",
            ErrorCode::UpdateConditionNotSatisfied => "UpdateConditionNotSatisfied",
            ErrorCode::XMethodIncorrectCount => "XMethodIncorrectCount",
            ErrorCode::XMethodIncorrectValue => "XMethodIncorrectValue",
            ErrorCode::XMethodNotUsingPost => "XMethodNotUsingPost",
            ErrorCode::Unrecognized => "Unrecognized",
        }
    }

    /// Returns the HTTP status the service answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 304 Not Modified
            ErrorCode::ConditionNotMetForRead => StatusCode::NOT_MODIFIED,

            // 400 Bad Request
            ErrorCode::ConditionHeadersNotSupported
            | ErrorCode::InvalidHeaderValue
            | ErrorCode::InvalidHttpVerb
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidMd5
            | ErrorCode::InvalidMetadata
            | ErrorCode::InvalidQueryParameterValue
            | ErrorCode::InvalidResourceName
            | ErrorCode::InvalidUri
            | ErrorCode::InvalidXmlDocument
            | ErrorCode::InvalidXmlNodeValue
            | ErrorCode::Md5Mismatch
            | ErrorCode::MetadataTooLarge
            | ErrorCode::MissingRequiredQueryParameter
            | ErrorCode::MissingRequiredHeader
            | ErrorCode::MissingRequiredXmlNode
            | ErrorCode::MultipleConditionHeadersNotSupported
            | ErrorCode::OutOfRangeInput
            | ErrorCode::OutOfRangeQueryParameterValue
            | ErrorCode::RequestUrlFailedToParse
            | ErrorCode::ResourceTypeMismatch
            | ErrorCode::UnsupportedHeader
            | ErrorCode::UnsupportedXmlNode
            | ErrorCode::UnsupportedQueryParameter
            | ErrorCode::InvalidBlobOrBlock
            | ErrorCode::InvalidBlobTier
            | ErrorCode::InvalidBlobType
            | ErrorCode::InvalidBlockId
            | ErrorCode::InvalidBlockList
            | ErrorCode::InvalidOperation
            | ErrorCode::InvalidPageRange
            | ErrorCode::InvalidSourceBlobType
            | ErrorCode::InvalidSourceBlobUrl
            | ErrorCode::InvalidVersionForPageBlobOperation
            | ErrorCode::BlockCountExceedsLimit
            | ErrorCode::BlockListTooLong
            | ErrorCode::EmptyMetadataKey
            | ErrorCode::InvalidMarker
            | ErrorCode::MessageTooLarge
            | ErrorCode::PopReceiptMismatch
            | ErrorCode::DuplicatePropertiesSpecified
            | ErrorCode::EntityTooLarge
            | ErrorCode::HostInformationNotPresent
            | ErrorCode::InvalidDuplicateRow
            | ErrorCode::InvalidValueType
            | ErrorCode::PropertiesNeedValue
            | ErrorCode::PropertyNameInvalid
            | ErrorCode::PropertyNameTooLong
            | ErrorCode::PropertyValueTooLarge
            | ErrorCode::TooManyProperties
            | ErrorCode::XMethodIncorrectCount
            | ErrorCode::XMethodIncorrectValue
            | ErrorCode::XMethodNotUsingPost => StatusCode::BAD_REQUEST,

            // 403 Forbidden
            ErrorCode::AccountIsDisabled
            | ErrorCode::AuthenticationFailed
            | ErrorCode::AuthorizationFailure
            | ErrorCode::AuthorizationPermissionMismatch
            | ErrorCode::AuthorizationProtocolMismatch
            | ErrorCode::AuthorizationResourceTypeMismatch
            | ErrorCode::AuthorizationServiceMismatch
            | ErrorCode::AuthorizationSourceIPMismatch
            | ErrorCode::InsufficientAccountPermissionsForRead
            | ErrorCode::InsufficientAccountPermissionsForWrite
            | ErrorCode::InsufficientAccountPermissionsForExecute
            | ErrorCode::InvalidAuthenticationInfo => StatusCode::FORBIDDEN,

            // 404 Not Found
            ErrorCode::BlobNotFound
            | ErrorCode::ContainerNotFound
            | ErrorCode::ResourceNotFound
            | ErrorCode::PreviousSnapshotNotFound
            | ErrorCode::QueueNotFound
            | ErrorCode::MessageNotFound
            | ErrorCode::TableNotFound
            | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            // 405 Method Not Allowed
            ErrorCode::UnsupportedHttpVerb
            | ErrorCode::UnsupportedBlobType
            | ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            // 409 Conflict
            ErrorCode::AccountAlreadyExists
            | ErrorCode::AccountBeingCreated
            | ErrorCode::BlobAlreadyExists
            | ErrorCode::BlobArchived
            | ErrorCode::BlobBeingRehydrated
            | ErrorCode::BlobImmutableDueToPolicy
            | ErrorCode::BlobNotArchived
            | ErrorCode::BlobOverwritten
            | ErrorCode::ContainerAlreadyExists
            | ErrorCode::ContainerBeingDeleted
            | ErrorCode::ContainerDisabled
            | ErrorCode::FeatureVersionMismatch
            | ErrorCode::LeaseAlreadyBroken
            | ErrorCode::LeaseAlreadyPresent
            | ErrorCode::LeaseIdMismatch
            | ErrorCode::LeaseIdMismatchWithBlobOperation
            | ErrorCode::LeaseIdMismatchWithContainerOperation
            | ErrorCode::LeaseIdMismatchWithLeaseOperation
            | ErrorCode::LeaseIsBreakingAndCannotBeAcquired
            | ErrorCode::LeaseIsBreakingAndCannotBeChanged
            | ErrorCode::LeaseIsBrokenAndCannotBeRenewed
            | ErrorCode::LeaseLost
            | ErrorCode::LeaseNotPresentWithBlobOperation
            | ErrorCode::LeaseNotPresentWithContainerOperation
            | ErrorCode::LeaseNotPresentWithLeaseOperation
            | ErrorCode::NoPendingCopyOperation
            | ErrorCode::PendingCopyOperation
            | ErrorCode::ResourceAlreadyExists
            | ErrorCode::SnapshotsPresent
            | ErrorCode::SystemInUse
            | ErrorCode::QueueAlreadyExists
            | ErrorCode::QueueBeingDeleted
            | ErrorCode::QueueDisabled
            | ErrorCode::QueueNotEmpty
            | ErrorCode::TableAlreadyExists
            | ErrorCode::TableBeingDeleted
            | ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            // 411 Length Required
            ErrorCode::MissingContentLengthHeader => StatusCode::LENGTH_REQUIRED,

            // 412 Precondition Failed
            ErrorCode::AppendPositionConditionNotMet
            | ErrorCode::ConditionNotMetForWrite
            | ErrorCode::LeaseIdMissing
            | ErrorCode::MaxBlobSizeConditionNotMet
            | ErrorCode::SequenceNumberConditionNotMet
            | ErrorCode::SourceConditionNotMet
            | ErrorCode::TargetConditionNotMet
            | ErrorCode::UpdateConditionNotSatisfied => StatusCode::PRECONDITION_FAILED,

            // 413 Payload Too Large
            ErrorCode::RequestBodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 415 Unsupported Media Type
            ErrorCode::AtomFormatNotSupported | ErrorCode::JsonFormatNotSupported => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }

            // 416 Range Not Satisfiable
            ErrorCode::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,

            // 500 Internal Server Error
            ErrorCode::InternalError
            | ErrorCode::OperationTimedOut
            | ErrorCode::CannotVerifyCopySource
            | ErrorCode::Unrecognized => StatusCode::INTERNAL_SERVER_ERROR,

            // 501 Not Implemented
            ErrorCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,

            // 503 Service Unavailable
            ErrorCode::ServerBusy
            | ErrorCode::ServerBusyIngress
            | ErrorCode::ServerBusyEgress
            | ErrorCode::ServerBusyOperations => StatusCode::SERVICE_UNAVAILABLE,

            // Default to 400 for anything not explicitly handled
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the message the service usually sends with this error.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::AuthenticationFailed => {
                "Server failed to authenticate the request. Make sure the value of the \
                 Authorization header is formed correctly including the signature."
            }
            ErrorCode::AuthorizationFailure => {
                "This request is not authorized to perform this operation."
            }
            ErrorCode::BlobNotFound => "The specified blob does not exist.",
            ErrorCode::ConditionNotMetForRead | ErrorCode::ConditionNotMetForWrite => {
                "The condition specified using HTTP conditional header(s) is not met."
            }
            ErrorCode::ContainerAlreadyExists => "The specified container already exists.",
            ErrorCode::ContainerNotFound => "The specified container does not exist.",
            ErrorCode::InsufficientAccountPermissionsForRead => {
                "Read operations are currently disabled."
            }
            ErrorCode::InsufficientAccountPermissionsForWrite => {
                "Write operations are not allowed."
            }
            ErrorCode::InsufficientAccountPermissionsForExecute => {
                "The account being accessed does not have sufficient permissions to execute \
                 this operation."
            }
            ErrorCode::InternalError => {
                "The server encountered an internal error. Please retry the request."
            }
            ErrorCode::MessageNotFound => "The specified message does not exist.",
            ErrorCode::OperationTimedOut => {
                "The operation could not be completed within the permitted time."
            }
            ErrorCode::QueueAlreadyExists => "The specified queue already exists.",
            ErrorCode::QueueNotFound => "The specified queue does not exist.",
            ErrorCode::ResourceNotFound => "The specified resource does not exist.",
            ErrorCode::ServerBusy => {
                "The server is currently unable to receive requests. Please retry your request."
            }
            ErrorCode::ServerBusyIngress => "Ingress is over the account limit.",
            ErrorCode::ServerBusyEgress => "Egress is over the account limit.",
            ErrorCode::ServerBusyOperations => "Operations per second is over the account limit.",
            ErrorCode::TableAlreadyExists => "The table specified already exists.",
            ErrorCode::TableNotFound => "The table specified does not exist.",
            ErrorCode::EntityAlreadyExists => "The specified entity already exists.",
            ErrorCode::EntityNotFound => "The specified resource does not exist.",
            _ => "An error occurred while processing the request.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An error response returned by the storage service, classified.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({status}): {message}")]
pub struct AzureError {
    /// Classified kind of the error.
    pub kind: ErrorCode,
    /// Service that produced the response.
    pub service: ServiceType,
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Raw error code as sent by the service.
    pub code: String,
    /// Raw error message as sent by the service.
    pub message: String,
    /// Value of the `x-ms-request-id` response header.
    pub request_id: Option<String>,
    /// Any extra elements of the error body.
    pub details: BTreeMap<String, String>,
}

/// Boxed error produced by an [`HttpTransport`](crate::transport::HttpTransport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Every way an operation can fail.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The service answered with an error response.
    #[error(transparent)]
    Azure(#[from] AzureError),

    /// The operation failed after more than one attempt.
    #[error("operation failed after {attempts} attempts: {source}")]
    Retried {
        attempts: u32,
        #[source]
        source: Box<StorageError>,
    },

    /// The request never produced an HTTP response.
    #[error("unidentified failure, no response was received: {0}")]
    Unidentified(#[source] TransportError),

    /// Something unexpected went wrong while executing the operation.
    #[error("general failure during operation: {message}")]
    General {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// Settings or request inputs are invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StorageError {
    pub fn config(message: impl Into<String>) -> Self {
        StorageError::Config(message.into())
    }

    pub fn general(message: impl Into<String>) -> Self {
        StorageError::General {
            message: message.into(),
            source: None,
        }
    }

    pub fn general_with(
        message: impl Into<String>,
        source: impl Into<TransportError>,
    ) -> Self {
        StorageError::General {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the service error, looking through a retry wrapper.
    pub fn azure(&self) -> Option<&AzureError> {
        match self {
            StorageError::Azure(e) => Some(e),
            StorageError::Retried { source, .. } => source.azure(),
            _ => None,
        }
    }

    /// Returns the classified error kind, if the service answered.
    pub fn kind(&self) -> Option<ErrorCode> {
        self.azure().map(|e| e.kind)
    }

    /// Number of attempts made before the operation gave up.
    pub fn attempts(&self) -> u32 {
        match self {
            StorageError::Retried { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_not_found() -> AzureError {
        AzureError {
            kind: ErrorCode::QueueNotFound,
            service: ServiceType::Queue,
            status: StatusCode::NOT_FOUND,
            code: "QueueNotFound".to_string(),
            message: "The specified queue does not exist.".to_string(),
            request_id: Some("req-1".to_string()),
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn test_split_codes_share_wire_code() {
        assert_eq!(ErrorCode::ConditionNotMetForRead.as_str(), "ConditionNotMet");
        assert_eq!(ErrorCode::ConditionNotMetForWrite.as_str(), "ConditionNotMet");
        assert_eq!(ErrorCode::ConditionNotMetForRead.status_code(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            ErrorCode::ConditionNotMetForWrite.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ErrorCode::InsufficientAccountPermissionsForExecute.as_str(),
            "InsufficientAccountPermissions"
        );
        for kind in [
            ErrorCode::ServerBusyIngress,
            ErrorCode::ServerBusyEgress,
            ErrorCode::ServerBusyOperations,
        ] {
            assert_eq!(kind.as_str(), "ServerBusy");
            assert_eq!(kind.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorCode::BlobNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::QueueAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ServerBusy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::InvalidRange.status_code(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[test]
    fn test_retried_exposes_inner_error() {
        let err = StorageError::Retried {
            attempts: 3,
            source: Box::new(StorageError::Azure(queue_not_found())),
        };

        assert_eq!(err.attempts(), 3);
        assert_eq!(err.kind(), Some(ErrorCode::QueueNotFound));
        assert!(err.to_string().contains("after 3 attempts"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = StorageError::Azure(queue_not_found());
        assert_eq!(
            err.to_string(),
            "QueueNotFound (404 Not Found): The specified queue does not exist."
        );
        assert_eq!(err.attempts(), 1);
        assert_eq!(StorageError::config("bad").kind(), None);
    }
}
