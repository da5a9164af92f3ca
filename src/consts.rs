//! Общие константы формата: имена файлов страниц, дефолты конфигурации.

// -------- Defaults --------
/// Номинальная ёмкость страницы (байт), проверяется до записи.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 4096;
/// Количество бакетов по умолчанию.
pub const DEFAULT_NUM_BUCKETS: u32 = 10;
/// Базовое имя таблицы (префикс файлов страниц).
pub const DEFAULT_TABLE: &str = "db";
/// Ключевое поле, если схема не задаёт primary_key.
pub const DEFAULT_KEY_FIELD: &str = "user_id";

// -------- Page files --------
// <base>/<table>_<bucket>.csv          (page_index == 0)
// <base>/<table>_<bucket>_<index>.csv  (page_index > 0)
pub const PAGE_FILE_EXT: &str = "csv";
pub const TMP_SUFFIX: &str = "tmp";

// -------- Lock --------
pub const LOCK_FILE: &str = "LOCK";

// -------- Schema --------
/// Относительный путь к схеме внутри корня хранилища (CLI default).
pub const SCHEMA_REL_PATH: &str = "schema/schema.json";

// -------- Row format --------
pub const FIELD_DELIMITER: u8 = b',';
pub const PAD_CHAR: char = ' ';
