// Server endpoints
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5006";
pub const SAVE_PATH: &str = "/api/salvar_config";
pub const SENSOR_DATA_PATH: &str = "/api/dados_sensor/";
pub const NETWORK_DATA_PATH: &str = "/api/dados_rede/";

// Status line
pub const STATUS_CLEAR_SECS: u64 = 3;

// Polling defaults (nivel3)
pub const DEFAULT_READ_INTERVAL_S: i64 = 10;
pub const DEFAULT_BASE_ID: i64 = 0;
pub const DEFAULT_RESPONSE_TIMEOUT_S: i64 = 20;

// Field mapping defaults
pub const DEFAULT_BYTE_POSITION: i64 = 0;
pub const DEFAULT_SIZE_BYTES: i64 = 1;
pub const DEFAULT_SCALE_DIVISOR: i64 = 1;

// Placeholders for a freshly added sensor
pub const NEW_SENSOR_DESCRIPTION: &str = "Novo Nó Sensor";
pub const NEW_SENSOR_DATA_TYPE: &str = "NovoTipo";
pub const NEW_SENSOR_FIELD_NAME: &str = "novo_campo";
pub const NEW_SENSOR_BYTE_POSITION: i64 = 16;
pub const NEW_SENSOR_SIZE_BYTES: i64 = 2;

// Activity log limit
pub const MAX_LOG_MESSAGES: usize = 100;
