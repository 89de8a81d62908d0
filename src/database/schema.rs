diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        email -> Text,
        password -> Nullable<Text>,
        picture -> Text,
    }
}
