//! Esquema Diesel (mantenido a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    flags (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        scope -> Text,
        code_changes -> Text,
        created_by -> Text,
        status -> Text,
        risk_level -> Nullable<Text>,
        config -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    risk_analyses (id) {
        id -> Uuid,
        flag_id -> Uuid,
        risk_level -> Text,
        risk_score -> Int2,
        detected_issues -> Jsonb,
        reasoning -> Text,
        recommendation -> Text,
        source -> Text,
        analyzed_at -> Timestamptz,
    }
}

diesel::table! {
    approvals (id) {
        id -> Uuid,
        flag_id -> Uuid,
        approver -> Text,
        status -> Text,
        comment -> Nullable<Text>,
        decided_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    flag_event_log (seq) {
        seq -> BigInt,
        flag_id -> Uuid,
        ts -> Timestamptz,
        event_type -> Text,
        payload -> Jsonb,
    }
}

diesel::joinable!(risk_analyses -> flags (flag_id));
diesel::joinable!(approvals -> flags (flag_id));

diesel::allow_tables_to_appear_in_same_query!(flags, risk_analyses, approvals, flag_event_log,);
