//! Vendor endpoints and polling invariants

pub const DOMAIN: &str = "loop";
pub const MANUFACTURER: &str = "Loop";
pub const MODEL: &str = "Loop Energy Sensor";
pub const DEFAULT_DEVICE_NAME: &str = "Loop";
pub const SIGNAL_NAME_PREFIX: &str = "signal_loop";

pub const IDENTITY_ENDPOINT: &str = "https://cognito-idp.eu-west-1.amazonaws.com/";
pub const CLIENT_ID: &str = "7e8i2f7mffi61b3vs9n35aocmt";
pub const LIVE_ENDPOINT: &str =
    "https://yfp2dgq9mk.execute-api.eu-west-1.amazonaws.com/Test/usage/live";
pub const PHANTOM_ENDPOINT: &str =
    "https://yfp2dgq9mk.execute-api.eu-west-1.amazonaws.com/Test/usage/phantom_load";

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PHANTOM_INTERVAL_SECS: u64 = 1800;
pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 120;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 15000;

pub const USER_AGENT: &str = "okhttp/3.12.1";
pub const AMZ_TARGET_INITIATE_AUTH: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
pub const AMZ_USER_AGENT: &str = "aws-amplify/0.1.x react-native";
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
