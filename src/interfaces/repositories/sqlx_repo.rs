use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxPropertyRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxAdminRepo {
    pub pool: PgPool,
}
