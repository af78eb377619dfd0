//! Demo data for development and tests. Seeded only when `seed_demo_data` is
//! enabled; production deployments provision ULBs and accounts out of band.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use jansetu_domain::auth::Role;
use jansetu_domain::ports::ulbs::UlbRepository;
use jansetu_domain::ports::users::UserRepository;
use jansetu_domain::ulbs::{Ulb, UlbKind};
use jansetu_domain::users::UserAccount;
use jansetu_domain::util::uuid_v7_without_dashes;

use crate::auth::password_digest;

pub const DEMO_PASSWORD: &str = "demo123";

pub fn demo_ulbs() -> Vec<Ulb> {
    vec![
        Ulb {
            ulb_id: "ulb_adi".to_string(),
            name: "Adityapur Municipal Corporation".to_string(),
            code: "ADI".to_string(),
            district: "Seraikela Kharsawan".to_string(),
            state: "Jharkhand".to_string(),
            kind: UlbKind::MunicipalCorporation,
        },
        Ulb {
            ulb_id: "ulb_bar".to_string(),
            name: "Barharwa Nagar Panchayat".to_string(),
            code: "BAR".to_string(),
            district: "Sahibganj".to_string(),
            state: "Jharkhand".to_string(),
            kind: UlbKind::NagarPanchayat,
        },
        Ulb {
            ulb_id: "ulb_ran".to_string(),
            name: "Ranchi Municipal Corporation".to_string(),
            code: "RAN".to_string(),
            district: "Ranchi".to_string(),
            state: "Jharkhand".to_string(),
            kind: UlbKind::MunicipalCorporation,
        },
    ]
}

pub fn demo_users() -> Vec<UserAccount> {
    let digest = password_digest(DEMO_PASSWORD);
    let account = |email: &str, name: &str, role: Role, department: &str, ulb: Option<&str>| {
        UserAccount {
            user_id: uuid_v7_without_dashes(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            department: Some(department.to_string()),
            ulb_id: ulb.map(str::to_string),
            extra_permissions: vec![],
            password_digest: digest.clone(),
            is_active: true,
            last_login_ms: None,
        }
    };

    vec![
        account(
            "superadmin@jharkhandmc.gov.in",
            "State Administrator",
            Role::SuperAdmin,
            "Urban Development",
            None,
        ),
        account(
            "admin@jharkhandmc.gov.in",
            "Municipal Administrator",
            Role::Admin,
            "Administration",
            Some("ulb_adi"),
        ),
        account(
            "manager@jharkhandmc.gov.in",
            "Department Manager",
            Role::Manager,
            "Public Works",
            Some("ulb_adi"),
        ),
        account(
            "commissioner@jharkhandmc.gov.in",
            "Municipal Commissioner",
            Role::Commissioner,
            "Office of the Commissioner",
            Some("ulb_adi"),
        ),
        account(
            "staff@jharkhandmc.gov.in",
            "Field Agent",
            Role::Staff,
            "Field Operations",
            Some("ulb_adi"),
        ),
    ]
}

pub async fn seed(
    ulbs: &Arc<dyn UlbRepository>,
    users: &Arc<dyn UserRepository>,
) -> Result<()> {
    for ulb in demo_ulbs() {
        ulbs.upsert(&ulb).await?;
    }
    let mut seeded = 0usize;
    for user in demo_users() {
        // Re-seeding an existing backend is a no-op per account.
        if users.find_by_email(&user.email).await?.is_none() {
            users.create(&user).await?;
            seeded += 1;
        }
    }
    info!(seeded, "demo data ready");
    Ok(())
}
