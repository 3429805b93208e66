//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the DDL in `schema_sync.rs` exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation.

diesel::table! {
    /// Registered users. `email` carries a unique constraint.
    users (id) {
        id -> Int8,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Playlists with their songs embedded as a JSONB array.
    ///
    /// `owner_email` references `users(email)`; `owner_id` references
    /// `users(id)` and is only populated by the ownership append.
    playlists (id) {
        id -> Int8,
        name -> Text,
        owner_email -> Text,
        owner_id -> Nullable<Int8>,
        songs -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Song catalog entries.
    songs (id) {
        id -> Int8,
        title -> Text,
        artist -> Text,
        year -> Int4,
        you_tube_id -> Text,
        listens -> Int4,
        playlist_count -> Int4,
        owner_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(playlists -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(playlists, songs, users);
