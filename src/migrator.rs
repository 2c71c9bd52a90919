use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_account_tables::Migration),
            Box::new(m20240101_000002_create_catalog_tables::Migration),
            Box::new(m20240101_000003_create_commerce_tables::Migration),
            Box::new(m20240101_000004_create_content_tables::Migration),
        ]
    }
}

fn id_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn timestamp_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn money_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .decimal_len(10, 2)
        .not_null()
        .default(0)
        .to_owned()
}

mod m20240101_000001_create_account_tables {
    use super::{id_column, timestamp_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_account_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(id_column(Users::Id))
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Phone).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Users::Status)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(timestamp_column(Users::CreatedAt))
                        .col(timestamp_column(Users::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Admins::Table)
                        .if_not_exists()
                        .col(id_column(Admins::Id))
                        .col(ColumnDef::new(Admins::Name).string().not_null())
                        .col(ColumnDef::new(Admins::Phone).string().not_null().unique_key())
                        .col(timestamp_column(Admins::CreatedAt))
                        .col(timestamp_column(Admins::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SubAdmins::Table)
                        .if_not_exists()
                        .col(id_column(SubAdmins::Id))
                        .col(ColumnDef::new(SubAdmins::Name).string().not_null())
                        .col(
                            ColumnDef::new(SubAdmins::Phone)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(SubAdmins::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SubAdmins::Role).json().not_null())
                        .col(timestamp_column(SubAdmins::CreatedAt))
                        .col(timestamp_column(SubAdmins::UpdatedAt))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SubAdmins::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Admins::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Name,
        Phone,
        Email,
        Status,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Admins {
        Table,
        Id,
        Name,
        Phone,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SubAdmins {
        Table,
        Id,
        Name,
        Phone,
        Email,
        Role,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_catalog_tables {
    use super::{id_column, money_column, timestamp_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Authors::Table)
                        .if_not_exists()
                        .col(id_column(Authors::Id))
                        .col(ColumnDef::new(Authors::Name).string().not_null())
                        .col(
                            ColumnDef::new(Authors::Royalty)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Authors::Percent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(timestamp_column(Authors::CreatedAt))
                        .col(timestamp_column(Authors::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Books::Table)
                        .if_not_exists()
                        .col(id_column(Books::Id))
                        .col(ColumnDef::new(Books::Name).string().not_null())
                        .col(ColumnDef::new(Books::AuthorId).integer().not_null())
                        .col(ColumnDef::new(Books::Image).json().not_null())
                        .col(ColumnDef::new(Books::Sample).json().not_null())
                        .col(ColumnDef::new(Books::Pdf).json().not_null())
                        .col(ColumnDef::new(Books::Tag).json().not_null())
                        .col(ColumnDef::new(Books::Description).text().not_null())
                        .col(money_column(Books::Price))
                        .col(money_column(Books::SellPrice))
                        .col(
                            ColumnDef::new(Books::IsTrending)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Books::IsRecommended)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Books::IsPremium)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Books::SubscriptionId).integer().null())
                        .col(timestamp_column(Books::CreatedAt))
                        .col(timestamp_column(Books::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_books_author_id")
                        .table(Books::Table)
                        .col(Books::AuthorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Ratings::Table)
                        .if_not_exists()
                        .col(id_column(Ratings::Id))
                        .col(ColumnDef::new(Ratings::BookId).integer().not_null())
                        .col(ColumnDef::new(Ratings::UserId).integer().not_null())
                        .col(ColumnDef::new(Ratings::UserName).string().not_null())
                        .col(ColumnDef::new(Ratings::Rate).integer().not_null())
                        .col(ColumnDef::new(Ratings::Review).text().null())
                        .col(timestamp_column(Ratings::CreatedAt))
                        .col(timestamp_column(Ratings::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ratings_book_id")
                        .table(Ratings::Table)
                        .col(Ratings::BookId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Favorites::Table)
                        .if_not_exists()
                        .col(id_column(Favorites::Id))
                        .col(ColumnDef::new(Favorites::UserId).integer().not_null())
                        .col(ColumnDef::new(Favorites::BookId).integer().not_null())
                        .col(timestamp_column(Favorites::CreatedAt))
                        .col(timestamp_column(Favorites::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_favorites_user_book")
                        .table(Favorites::Table)
                        .col(Favorites::UserId)
                        .col(Favorites::BookId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(id_column(Notifications::Id))
                        .col(ColumnDef::new(Notifications::BookId).integer().not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(timestamp_column(Notifications::CreatedAt))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Favorites::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Ratings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Books::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Authors::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Authors {
        Table,
        Id,
        Name,
        Royalty,
        Percent,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Books {
        Table,
        Id,
        Name,
        AuthorId,
        Image,
        Sample,
        Pdf,
        Tag,
        Description,
        Price,
        SellPrice,
        IsTrending,
        IsRecommended,
        IsPremium,
        SubscriptionId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Ratings {
        Table,
        Id,
        BookId,
        UserId,
        UserName,
        Rate,
        Review,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Favorites {
        Table,
        Id,
        UserId,
        BookId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        BookId,
        Title,
        CreatedAt,
    }
}

mod m20240101_000003_create_commerce_tables {
    use super::{id_column, money_column, timestamp_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_commerce_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(id_column(Carts::Id))
                        .col(ColumnDef::new(Carts::UserId).integer().not_null())
                        .col(ColumnDef::new(Carts::BookId).integer().not_null())
                        .col(ColumnDef::new(Carts::Qty).integer().not_null().default(1))
                        .col(timestamp_column(Carts::CreatedAt))
                        .col(timestamp_column(Carts::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_carts_user_book")
                        .table(Carts::Table)
                        .col(Carts::UserId)
                        .col(Carts::BookId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(id_column(Coupons::Id))
                        .col(
                            ColumnDef::new(Coupons::Coupon)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Coupons::Type).string_len(10).not_null())
                        .col(money_column(Coupons::Value))
                        .col(ColumnDef::new(Coupons::Qty).integer().not_null().default(1))
                        .col(ColumnDef::new(Coupons::Description).text().null())
                        .col(timestamp_column(Coupons::CreatedAt))
                        .col(timestamp_column(Coupons::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Plans::Table)
                        .if_not_exists()
                        .col(id_column(Plans::Id))
                        .col(ColumnDef::new(Plans::Image).string().not_null())
                        .col(ColumnDef::new(Plans::Title).string().not_null())
                        .col(ColumnDef::new(Plans::Benefits).json().not_null())
                        .col(ColumnDef::new(Plans::Duration).string().not_null())
                        .col(ColumnDef::new(Plans::DurationDays).integer().not_null())
                        .col(money_column(Plans::Price))
                        .col(money_column(Plans::PriceInMonth))
                        .col(money_column(Plans::PriceInYears))
                        .col(
                            ColumnDef::new(Plans::SavePercent)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(timestamp_column(Plans::CreatedAt))
                        .col(timestamp_column(Plans::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(id_column(Orders::Id))
                        .col(ColumnDef::new(Orders::UserId).integer().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(money_column(Orders::TotalAmount))
                        .col(money_column(Orders::Discount))
                        .col(money_column(Orders::FinalAmount))
                        .col(ColumnDef::new(Orders::TraId).string().not_null())
                        .col(ColumnDef::new(Orders::Type).string_len(10).not_null())
                        .col(ColumnDef::new(Orders::CouponCode).string().null())
                        .col(timestamp_column(Orders::CreatedAt))
                        .col(timestamp_column(Orders::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(id_column(Transactions::Id))
                        .col(ColumnDef::new(Transactions::UserId).integer().not_null())
                        .col(money_column(Transactions::Amount))
                        .col(ColumnDef::new(Transactions::Title).string().not_null())
                        .col(ColumnDef::new(Transactions::OrderId).string().not_null())
                        .col(timestamp_column(Transactions::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Libraries::Table)
                        .if_not_exists()
                        .col(id_column(Libraries::Id))
                        .col(ColumnDef::new(Libraries::UserId).integer().not_null())
                        .col(ColumnDef::new(Libraries::BookId).integer().not_null())
                        .col(ColumnDef::new(Libraries::OrderId).string().not_null())
                        .col(ColumnDef::new(Libraries::Source).string_len(20).not_null())
                        .col(money_column(Libraries::Amount))
                        .col(timestamp_column(Libraries::CreatedAt))
                        .to_owned(),
                )
                .await?;

            // One library entry per (user, book)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_libraries_user_book")
                        .table(Libraries::Table)
                        .col(Libraries::UserId)
                        .col(Libraries::BookId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Premiums::Table)
                        .if_not_exists()
                        .col(id_column(Premiums::Id))
                        .col(ColumnDef::new(Premiums::UserId).integer().not_null())
                        .col(ColumnDef::new(Premiums::PlanId).integer().not_null())
                        .col(ColumnDef::new(Premiums::OrderId).string().not_null())
                        .col(
                            ColumnDef::new(Premiums::Status)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp_column(Premiums::PurchasedAt))
                        .col(timestamp_column(Premiums::ExpireOn))
                        .col(ColumnDef::new(Premiums::TrId).string().not_null())
                        .col(timestamp_column(Premiums::CreatedAt))
                        .col(timestamp_column(Premiums::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_premiums_user_plan")
                        .table(Premiums::Table)
                        .col(Premiums::UserId)
                        .col(Premiums::PlanId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Premiums::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Libraries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Plans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        UserId,
        BookId,
        Qty,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Coupons {
        Table,
        Id,
        Coupon,
        Type,
        Value,
        Qty,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Plans {
        Table,
        Id,
        Image,
        Title,
        Benefits,
        Duration,
        DurationDays,
        Price,
        PriceInMonth,
        PriceInYears,
        SavePercent,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        UserId,
        OrderId,
        TotalAmount,
        Discount,
        FinalAmount,
        TraId,
        Type,
        CouponCode,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Transactions {
        Table,
        Id,
        UserId,
        Amount,
        Title,
        OrderId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Libraries {
        Table,
        Id,
        UserId,
        BookId,
        OrderId,
        Source,
        Amount,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Premiums {
        Table,
        Id,
        UserId,
        PlanId,
        OrderId,
        Status,
        PurchasedAt,
        ExpireOn,
        TrId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_content_tables {
    use super::{id_column, timestamp_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_content_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Banners::Table)
                        .if_not_exists()
                        .col(id_column(Banners::Id))
                        .col(ColumnDef::new(Banners::Image).string().not_null())
                        .col(timestamp_column(Banners::CreatedAt))
                        .col(timestamp_column(Banners::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Faqs::Table)
                        .if_not_exists()
                        .col(id_column(Faqs::Id))
                        .col(ColumnDef::new(Faqs::Question).string().not_null())
                        .col(ColumnDef::new(Faqs::Answer).text().not_null())
                        .col(timestamp_column(Faqs::CreatedAt))
                        .col(timestamp_column(Faqs::UpdatedAt))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Faqs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Banners::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Banners {
        Table,
        Id,
        Image,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Faqs {
        Table,
        Id,
        Question,
        Answer,
        CreatedAt,
        UpdatedAt,
    }
}
