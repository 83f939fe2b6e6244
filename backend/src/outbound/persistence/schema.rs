//! Diesel table definitions for the lending schema.
//!
//! These must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Copy counters per title.
    ///
    /// A check constraint keeps `0 <= available_copies <= total_copies`.
    books (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Copies the library owns.
        total_copies -> Int8,
        /// Copies on the shelf.
        available_copies -> Int8,
    }
}

diesel::table! {
    /// Rentals, one row per borrowed copy.
    rentals (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Borrowed title.
        book_id -> Uuid,
        /// Borrower.
        user_id -> Uuid,
        /// When the copy was checked out.
        rental_date -> Timestamptz,
        /// When the copy is due back.
        due_date -> Timestamptz,
        /// When the copy came back; null while open.
        return_date -> Nullable<Timestamptz>,
        /// `active`, `returned` or `overdue`.
        status -> Text,
        /// Optimistic concurrency counter, bumped by every transition.
        version -> Int8,
    }
}

diesel::joinable!(rentals -> books (book_id));
diesel::allow_tables_to_appear_in_same_query!(books, rentals);
