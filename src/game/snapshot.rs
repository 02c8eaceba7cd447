//! Seed messages for a freshly connected client

use std::collections::HashMap;

use crate::ws::protocol::{Player, PlayerId, Projectile, ServerMsg};

use super::{Outbound, PlayerState};

/// Welcome + full player mapping + live projectiles, addressed to `id` only
pub fn seed_for(
    id: PlayerId,
    players: &HashMap<PlayerId, PlayerState>,
    projectiles: &[Projectile],
) -> Vec<Outbound> {
    let players: HashMap<PlayerId, Player> = players
        .iter()
        .map(|(id, state)| (*id, state.player.clone()))
        .collect();

    vec![
        Outbound::only(id, ServerMsg::Welcome { id }),
        Outbound::only(id, ServerMsg::CurrentPlayers { players }),
        Outbound::only(
            id,
            ServerMsg::CurrentBullets {
                bullets: projectiles.to_vec(),
            },
        ),
    ]
}
