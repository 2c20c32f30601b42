pub mod city;
pub mod facade;
pub mod ui;
