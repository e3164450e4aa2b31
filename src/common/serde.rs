/// Custom serialization/deserialization for i64 as a string.
///
/// The Gemini API encodes 64-bit integers (such as `sizeBytes`) as JSON strings.
pub(crate) mod i64_as_string {
    /// Optional `i64` as string.
    pub(crate) mod optional {
        use serde::{self, de, Deserialize, Deserializer, Serializer};

        /// Serializes an `Option<i64>` as a string or `None`.
        pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => serializer.serialize_str(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes a string into an `Option<i64>`.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| s.parse::<i64>().map_err(de::Error::custom))
                .transpose()
        }
    }
}

/// Custom serialization/deserialization for mime::Mime as a string.
pub(crate) mod mime_as_string {
    /// Optional `Mime` as string.
    pub(crate) mod optional {
        use mime::Mime;
        use serde::{self, de, Deserialize, Deserializer, Serializer};

        /// Serializes an `Option<Mime>` as a string or `None`.
        pub fn serialize<S>(value: &Option<Mime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => serializer.serialize_str(v.as_ref()),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes a string into an `Option<Mime>`.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Mime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| s.parse::<Mime>().map_err(de::Error::custom))
                .transpose()
        }
    }
}
