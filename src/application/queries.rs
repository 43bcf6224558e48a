pub struct ListEventCallbacksQuery {
    pub plan_id: String,
}

pub struct GetEventCallbackQuery {
    pub plan_id: String,
    pub event_id: String,
}
