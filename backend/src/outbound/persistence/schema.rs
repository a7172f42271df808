//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` and `username` carry the `users_email_key` and
    /// `users_username_key` unique constraints.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        username -> Varchar,
        /// PHC-encoded Argon2id hash; never selected into outward types.
        password_hash -> Text,
        full_name -> Nullable<Varchar>,
        institution -> Nullable<Varchar>,
        /// One of `free`, `pro`, `enterprise`.
        tier -> Varchar,
        /// One of `member`, `admin`.
        role -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Research projects, owned by exactly one user.
    projects (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        disease_target -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Molecules, denormalised with the owning user for owner-scoped search.
    molecules (id) {
        id -> Uuid,
        project_id -> Uuid,
        user_id -> Uuid,
        smiles -> Varchar,
        name -> Nullable<Varchar>,
        generation_method -> Varchar,
        molecular_weight -> Nullable<Float8>,
        logp -> Nullable<Float8>,
        tpsa -> Nullable<Float8>,
        qed -> Nullable<Float8>,
        num_hbd -> Nullable<Int4>,
        num_hba -> Nullable<Int4>,
        num_rotatable_bonds -> Nullable<Int4>,
        num_aromatic_rings -> Nullable<Int4>,
        num_heavy_atoms -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Model outputs attached to a molecule. Unique per molecule, category,
    /// and model version.
    predictions (id) {
        id -> Uuid,
        molecule_id -> Uuid,
        category -> Varchar,
        payload -> Jsonb,
        confidence -> Nullable<Float8>,
        model_version -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail.
    activity_log (id) {
        id -> Uuid,
        user_id -> Uuid,
        action -> Varchar,
        target_kind -> Nullable<Varchar>,
        target_id -> Nullable<Uuid>,
        details -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (user_id));
diesel::joinable!(molecules -> projects (project_id));
diesel::joinable!(predictions -> molecules (molecule_id));
diesel::joinable!(activity_log -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, projects, molecules, predictions, activity_log);
