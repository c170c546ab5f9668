use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::models::courier::Courier;
use crate::models::tags::TagSet;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub courier: Courier,
    pub distance_km: f64,
}

/// Read-only projection of a ranked candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub courier_id: Uuid,
    pub name: String,
    pub distance_km: f64,
    pub tags: TagSet,
    pub is_vip: bool,
}

impl From<&Candidate> for CandidateView {
    fn from(candidate: &Candidate) -> Self {
        Self {
            courier_id: candidate.courier.id,
            name: candidate.courier.name.clone(),
            distance_km: candidate.distance_km,
            tags: candidate.courier.tags.clone(),
            is_vip: candidate.courier.is_vip(),
        }
    }
}

/// Orders candidates nearest-first. With `prefer_vip`, every VIP-tagged
/// courier ranks ahead of every other courier, nearest-first within each
/// group. The sort is stable, so equal keys keep their input order.
pub fn rank(mut candidates: Vec<Candidate>, prefer_vip: bool) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        vip_group(a, prefer_vip)
            .cmp(&vip_group(b, prefer_vip))
            .then_with(|| compare_distance(a.distance_km, b.distance_km))
    });
    candidates
}

fn vip_group(candidate: &Candidate, prefer_vip: bool) -> u8 {
    if prefer_vip && !candidate.courier.is_vip() {
        1
    } else {
        0
    }
}

fn compare_distance(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
