// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side operations, grouped by entity.

pub mod aggregates;
pub mod events;
pub mod mappings;
pub mod operators;
pub mod orgs;
pub mod sessions;
pub mod teams;
