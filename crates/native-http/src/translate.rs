//! Translation of native errors into [`ErrorKind`]s

use serde_json::{json, Map, Value};

use crate::error::{ErrorKind, HttpError, NATIVE_ERROR_KEY};
use crate::event::NativeResponse;
use crate::platform::Platform;

/// Exception type reported by the Android module for transport failures
pub const ANDROID_IO_EXCEPTION: &str = "IOException";

/// Error domain reported by the iOS module for transport failures
pub const IOS_URL_ERROR_DOMAIN: &str = "NSURLErrorDomain";

/// Error domain reported by the iOS module when response serialization fails
pub const IOS_RESPONSE_SERIALIZATION: &str = "com.alamofire.error.serialization.response";

/// Message used when a success event carries neither payload nor error
pub const EMPTY_PAYLOAD_MESSAGE: &str = "empty response payload";

/// Map a native error to its portable kind. Unmapped combinations yield
/// [`ErrorKind::Unknown`].
pub fn translate(platform: Platform, native_type: &str, native_code: i64) -> ErrorKind {
    match platform {
        Platform::Android => translate_android(native_type, native_code),
        Platform::Ios => translate_ios(native_type, native_code),
    }
}

fn translate_android(native_type: &str, native_code: i64) -> ErrorKind {
    if native_type != ANDROID_IO_EXCEPTION {
        return ErrorKind::Unknown;
    }

    match native_code {
        -1000 => ErrorKind::Canceled,
        -1001 => ErrorKind::NotConnectedToInternet,
        -1002 => ErrorKind::TimedOut,
        -1003 => ErrorKind::ServerCertificateUntrusted,
        _ => ErrorKind::RequestFailed,
    }
}

fn translate_ios(native_type: &str, native_code: i64) -> ErrorKind {
    match native_type {
        IOS_URL_ERROR_DOMAIN => match native_code {
            // NSURLErrorCancelled
            -999 => ErrorKind::Canceled,
            // NSURLErrorNotConnectedToInternet
            -1009 => ErrorKind::NotConnectedToInternet,
            // NSURLErrorTimedOut
            -1001 => ErrorKind::TimedOut,
            // secure connection and certificate failures, plus
            // kCFErrorHTTPSProxyConnectionFailure (310)
            -1204..=-1200 | 310 => ErrorKind::ServerCertificateUntrusted,
            _ => ErrorKind::RequestFailed,
        },
        IOS_RESPONSE_SERIALIZATION => ErrorKind::ParseResponseFailed,
        _ => ErrorKind::Unknown,
    }
}

/// Native cancellation code of `platform`, as reported in error events
pub fn cancellation_code(platform: Platform) -> (&'static str, i64) {
    match platform {
        Platform::Android => (ANDROID_IO_EXCEPTION, -1000),
        Platform::Ios => (IOS_URL_ERROR_DOMAIN, -999),
    }
}

/// Build the [`HttpError`] for a failed response.
///
/// `user_info` receives every response field except the error object, plus a
/// `nativeError` copy of it. A response without an error object becomes
/// [`ErrorKind::RequestFailed`].
pub fn translate_response(platform: Platform, response: NativeResponse) -> HttpError {
    let NativeResponse {
        data,
        error,
        fields,
    } = response;

    let mut user_info: Map<String, Value> = fields;
    if let Some(data) = data {
        user_info.insert("data".to_string(), data);
    }

    match error {
        Some(native) => {
            let kind = translate(platform, &native.error_type, native.code);
            user_info.insert(
                NATIVE_ERROR_KEY.to_string(),
                json!({
                    "type": native.error_type,
                    "code": native.code,
                    "message": native.message,
                }),
            );
            HttpError::new(kind, native.message).with_user_info(user_info)
        }
        None => HttpError::new(ErrorKind::RequestFailed, EMPTY_PAYLOAD_MESSAGE)
            .with_user_info(user_info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NativeError;

    #[test]
    fn test_android_table() {
        let cases = [
            (-1000, ErrorKind::Canceled),
            (-1001, ErrorKind::NotConnectedToInternet),
            (-1002, ErrorKind::TimedOut),
            (-1003, ErrorKind::ServerCertificateUntrusted),
            (-1, ErrorKind::RequestFailed),
            (404, ErrorKind::RequestFailed),
        ];
        for (code, kind) in cases {
            assert_eq!(
                translate(Platform::Android, ANDROID_IO_EXCEPTION, code),
                kind,
                "IOException {code}"
            );
        }
        assert_eq!(
            translate(Platform::Android, "JSONException", -1000),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_ios_table() {
        let cases = [
            (-999, ErrorKind::Canceled),
            (-1009, ErrorKind::NotConnectedToInternet),
            (-1001, ErrorKind::TimedOut),
            (-1200, ErrorKind::ServerCertificateUntrusted),
            (-1201, ErrorKind::ServerCertificateUntrusted),
            (-1202, ErrorKind::ServerCertificateUntrusted),
            (-1203, ErrorKind::ServerCertificateUntrusted),
            (-1204, ErrorKind::ServerCertificateUntrusted),
            (310, ErrorKind::ServerCertificateUntrusted),
            (-1205, ErrorKind::RequestFailed),
            (-1199, ErrorKind::RequestFailed),
            (-1004, ErrorKind::RequestFailed),
        ];
        for (code, kind) in cases {
            assert_eq!(
                translate(Platform::Ios, IOS_URL_ERROR_DOMAIN, code),
                kind,
                "NSURLErrorDomain {code}"
            );
        }
        assert_eq!(
            translate(Platform::Ios, IOS_RESPONSE_SERIALIZATION, 3840),
            ErrorKind::ParseResponseFailed
        );
        assert_eq!(
            translate(Platform::Ios, "NSCocoaErrorDomain", -999),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_tables_are_platform_specific() {
        assert_eq!(
            translate(Platform::Ios, ANDROID_IO_EXCEPTION, -1000),
            ErrorKind::Unknown
        );
        assert_eq!(
            translate(Platform::Android, IOS_URL_ERROR_DOMAIN, -999),
            ErrorKind::Unknown
        );
        assert_eq!(
            translate(Platform::Android, IOS_RESPONSE_SERIALIZATION, 0),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_cancellation_codes_translate_to_canceled() {
        for platform in [Platform::Android, Platform::Ios] {
            let (native_type, code) = cancellation_code(platform);
            assert_eq!(translate(platform, native_type, code), ErrorKind::Canceled);
        }
    }

    #[test]
    fn test_translate_response_keeps_fields_and_native_error() {
        let response = NativeResponse::with_error(NativeError::new(
            ANDROID_IO_EXCEPTION,
            -1002,
            "timeout",
        ))
        .field("statusCode", 0);

        let error = translate_response(Platform::Android, response);
        assert_eq!(error.kind, ErrorKind::TimedOut);
        assert_eq!(error.code, 0);
        assert_eq!(error.message, "timeout");
        assert_eq!(error.user_info.get("statusCode"), Some(&json!(0)));
        assert!(error.user_info.get("error").is_none());
        assert_eq!(
            error.user_info.get(NATIVE_ERROR_KEY),
            Some(&json!({"type": "IOException", "code": -1002, "message": "timeout"}))
        );
    }

    #[test]
    fn test_translate_response_without_error_object() {
        let error = translate_response(Platform::Ios, NativeResponse::default().field("x", 1));
        assert_eq!(error.kind, ErrorKind::RequestFailed);
        assert_eq!(error.message, EMPTY_PAYLOAD_MESSAGE);
        assert!(error.native_error().is_none());
        assert_eq!(error.user_info.get("x"), Some(&json!(1)));
    }
}
